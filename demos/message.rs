use wbxml_pack::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Token tables shared by client and server
    let pages = CodePages::new()
        .tag(0, 0x05, "Messages")
        .tag(0, 0x06, "Message")
        .tag(0, 0x07, "Subject")
        .tag(0, 0x08, "Body")
        .tag(1, 0x05, "Attachment")
        .attribute(0, 0x05, "id")
        .attribute(0, 0x06, "from")
        .attribute(1, 0x05, "mime");

    let mut message = Element::new("Message");
    message.set_attribute("id", "1138");
    message.set_attribute("from", "operator@example.com");
    message.add_child(Element::with_text("Subject", "Shift report"));
    message.add_child(Element::with_text(
        "Body",
        "All three jobs finished. The nightly export ran long, see the attached log.",
    ));
    let mut attachment = Element::with_opaque("Attachment", b"export: 41211 rows\n".to_vec());
    attachment.set_attribute("mime", "text/plain");
    message.add_child(attachment);
    // Not on any code page, so this name goes through the string table
    message.add_child(Element::with_text("Priority", "high"));

    let mut root = Element::new("Messages");
    root.add_child(message);
    let doc = Document::new(root).with_public_id(PublicId::Named("-//EXAMPLE//DTD Messages 1.0//EN".into()));

    let bytes = Encoder::new().code_pages(&pages).encode(&doc)?;
    let literal = encode(&doc)?;
    println!(
        "Encoded {} bytes with code pages, {} bytes without",
        bytes.len(),
        literal.len()
    );

    let decoded = Decoder::new().code_pages(&pages).decode(&bytes)?;
    assert_eq!(decoded, doc);
    println!("{:#}", decoded);

    let message = decoded.root().child("Message").ok_or("no message")?;
    println!(
        "Message {} from {}: {}",
        message.attribute_value("id").unwrap_or("?"),
        message.attribute_value("from").unwrap_or("?"),
        message.child_text("Subject").unwrap_or_default()
    );
    if let Some(data) = message.child_opaque("Attachment") {
        println!("Attachment is {} bytes", data.len());
    }
    Ok(())
}
