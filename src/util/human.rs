/// Format bits/s into a human-readable string: "12.5 Mbps"
pub fn fmt_bps(bits_per_sec: f64) -> String {
    const T: f64 = 1_000_000_000_000.0;
    const G: f64 = 1_000_000_000.0;
    const M: f64 = 1_000_000.0;
    const K: f64 = 1_000.0;
    let b = bits_per_sec.max(0.0);
    if b >= T      { format!("{:.1} Tbps", b / T) }
    else if b >= G { format!("{:.1} Gbps", b / G) }
    else if b >= M { format!("{:.1} Mbps", b / M) }
    else if b >= K { format!("{:.1} Kbps", b / K) }
    else           { format!("{:.0} bps",  b) }
}

/// Format a percentage with one decimal: "1.4%"
pub fn fmt_pct(pct: f64) -> String {
    format!("{:.1}%", pct)
}

/// Format a count with K/M suffixes: "1.2K"
pub fn fmt_count(n: f64) -> String {
    let v = n.max(0.0);
    if v >= 1_000_000.0 { format!("{:.1}M", v / 1_000_000.0) }
    else if v >= 1_000.0 { format!("{:.1}K", v / 1_000.0) }
    else { format!("{:.0}", v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates() {
        assert_eq!(fmt_bps(0.0), "0 bps");
        assert_eq!(fmt_bps(1_500.0), "1.5 Kbps");
        assert_eq!(fmt_bps(12_500_000.0), "12.5 Mbps");
        assert_eq!(fmt_bps(2_000_000_000.0), "2.0 Gbps");
        assert_eq!(fmt_bps(-5.0), "0 bps");
    }

    #[test]
    fn pct_and_count() {
        assert_eq!(fmt_pct(1.44), "1.4%");
        assert_eq!(fmt_count(999.0), "999");
        assert_eq!(fmt_count(1_240.0), "1.2K");
        assert_eq!(fmt_count(3_000_000.0), "3.0M");
    }
}
