/// Shorten a signature or address for log lines
pub fn short_id(id: &str) -> String {
    let len = id.chars().count();
    if len <= 12 {
        return id.to_string();
    }
    let head: String = id.chars().take(6).collect();
    let tail: String = id.chars().skip(len - 6).collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::short_id;

    #[test]
    fn shortens_long_ids_only() {
        assert_eq!(short_id("SIG1"), "SIG1");
        assert_eq!(short_id("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"), "675kPX...Ut1Mp8");
    }
}
