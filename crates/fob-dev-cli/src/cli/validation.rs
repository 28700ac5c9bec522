/// Parse a listening or connecting port.
///
/// Port 0 is rejected: clients need a port they can dial.
///
/// # Errors
///
/// Returns an error message if the value is not a number in 1..=65535.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("Port must be a number between 1 and 65535: '{}'", s))?;
    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }
    Ok(port)
}

/// Parse a host name or IP address.
///
/// Rejects empty values and values carrying a scheme, port or path.
///
/// # Errors
///
/// Returns an error message describing what is wrong with the host.
pub fn parse_host(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("Host cannot be empty".to_string());
    }
    if s.contains("://") {
        return Err(format!("Host must not include a scheme: '{}'", s));
    }
    if s.contains('/') || s.chars().any(char::is_whitespace) {
        return Err(format!("Invalid host: '{}'", s));
    }
    // A single colon means host:port; IPv6 literals have several.
    if s.matches(':').count() == 1 {
        return Err(format!("Pass the port with --port, not in the host: '{}'", s));
    }
    Ok(s.to_string())
}
