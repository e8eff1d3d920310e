use base64::{engine::general_purpose, Engine as _};

/// Encodes a string to Base64 format (standard alphabet, padded).
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Pads a Base64 string with `=` up to a multiple of 4.
pub fn restore_padding(input: &str) -> String {
    let trimmed = input.trim_end_matches('=');
    let missing = (4 - trimmed.len() % 4) % 4;
    let mut padded = String::with_capacity(trimmed.len() + missing);
    padded.push_str(trimmed);
    padded.extend(std::iter::repeat('=').take(missing));
    padded
}

/// Decodes a Base64 string to UTF-8 text.
///
/// Missing padding is restored first. The standard alphabet is tried before
/// the URL-safe one.
///
/// # Returns
/// The decoded string, or `None` if the input is not Base64 or not UTF-8.
pub fn base64_decode(input: &str) -> Option<String> {
    let padded = restore_padding(input.trim());
    let bytes = general_purpose::STANDARD
        .decode(&padded)
        .or_else(|_| general_purpose::URL_SAFE.decode(&padded))
        .ok()?;
    String::from_utf8(bytes).ok()
}
