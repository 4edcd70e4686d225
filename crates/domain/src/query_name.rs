/// Derives the subdomain a proof is requested for.
///
/// Strips one trailing dot from `qname`, then the base zone (matched on a
/// label boundary, ASCII case-insensitive), then the dot left in between.
/// A query for the zone apex yields an empty string. Names outside the zone
/// come back whole and simply fail lookup at the map server.
pub fn extract_subdomain(qname: &str, base_zone: &str) -> String {
    let name = qname.strip_suffix('.').unwrap_or(qname);
    let zone = base_zone.strip_suffix('.').unwrap_or(base_zone);

    let subdomain = if zone.is_empty() {
        name
    } else if name.eq_ignore_ascii_case(zone) {
        ""
    } else if let Some(prefix) = strip_suffix_ignore_case(name, zone) {
        prefix.strip_suffix('.').unwrap_or(name)
    } else {
        name
    };

    subdomain.to_ascii_lowercase()
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    if name.len() <= suffix.len() || !name.is_char_boundary(name.len() - suffix.len()) {
        return None;
    }
    let (head, tail) = name.split_at(name.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
