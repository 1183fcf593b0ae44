use crate::dashboard::DashboardSnapshot;
use crate::models::observation::RankedEntity;
use crate::util::human::{fmt_bps, fmt_count, fmt_pct};

/// Generate a human-readable dashboard report to a String.
pub fn generate(snap: &DashboardSnapshot) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  ticktop Report — {}\n", now));
    out.push_str("═══════════════════════════════════════════════\n\n");
    out.push_str(&format!(
        "  Messages: {} handled, {} ignored\n\n",
        snap.messages_handled, snap.messages_ignored,
    ));

    // ── Throughput ─────────────────────────────────────────────────────
    out.push_str(&format!(
        "── Throughput ({} of {} samples) ──────────────\n",
        snap.throughput_samples, snap.throughput.len(),
    ));
    if snap.throughput_samples == 0 {
        out.push_str("  (no samples)\n");
    } else {
        out.push_str(&format!("  {:<6} {:>12} {:>12} {:>12}\n", "", "Latest", "Avg", "Peak"));
        for (label, s) in [("Down", &snap.down_stats), ("Up", &snap.up_stats)] {
            out.push_str(&format!(
                "  {:<6} {:>12} {:>12} {:>12}\n",
                label, fmt_bps(s.latest), fmt_bps(s.mean), fmt_bps(s.peak),
            ));
        }
    }
    out.push('\n');

    // ── Adjustments ────────────────────────────────────────────────────
    let adjustments: u64 = snap.adjustments.iter().map(|&c| c as u64).sum();
    out.push_str(&format!("  Bandwidth adjustments in window: {}\n\n", fmt_count(adjustments as f64)));

    push_ranking(&mut out, "Top Circuits", &snap.top_circuits);
    push_ranking(&mut out, "Top ASNs", &snap.top_asns);

    out.push_str("═══════════════════════════════════════════════\n");
    out
}

fn push_ranking(out: &mut String, title: &str, entities: &[RankedEntity]) {
    out.push_str(&format!("── {} ({}) ─────────────────────────\n", title, entities.len()));
    if entities.is_empty() {
        out.push_str("  (none)\n\n");
        return;
    }
    out.push_str(&format!("  {:>3}  {:<24} {:>12} {:>9}\n", "#", "Key", "Rate", "Retx"));
    out.push_str(&format!("  {}\n", "─".repeat(52)));
    for (i, e) in entities.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3}  {:<24} {:>12} {:>9}\n",
            i + 1, e.key, fmt_bps(e.value), fmt_pct(e.quality),
        ));
    }
    out.push('\n');
}
