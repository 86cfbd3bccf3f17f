use std::fmt::{self, Write as _};

use anyhow::Result;

use crate::analysis::{AnalysisResult, RankedIdentity};
use crate::domain::range::DATE_FORMAT;

const RULE_WIDTH: usize = 50;

/// Fixed-section plain text report.
pub fn render_text(r: &AnalysisResult) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_text(&mut out, r);
    out
}

fn write_text(out: &mut String, r: &AnalysisResult) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "Mail analysis")?;
    if !r.account.is_empty() {
        writeln!(out, "Account: {}", r.account)?;
    }
    if let Some(range) = &r.range {
        writeln!(
            out,
            "Period:  {} to {}",
            range.start.format(DATE_FORMAT),
            range.end.format(DATE_FORMAT)
        )?;
    }
    writeln!(out, "{rule}")?;

    writeln!(out, "\n1. Inbox")?;
    writeln!(out, "   Total received: {}", r.total_received)?;

    writeln!(out, "\n2. Read status")?;
    let s = &r.read_status;
    writeln!(out, "   Read:   {} ({:.1}%)", s.read, s.read_pct)?;
    writeln!(out, "   Unread: {} ({:.1}%)", s.unread, s.unread_pct)?;

    writeln!(out, "\n3. Replies")?;
    writeln!(out, "   Replied:          {}", r.replied)?;
    writeln!(out, "   Replied same day: {}", r.same_day_replies)?;

    writeln!(out, "\n4. Top senders")?;
    write_ranking(out, &r.top_senders)?;

    writeln!(out, "\n5. Top recipients")?;
    write_ranking(out, &r.top_recipients)?;

    writeln!(out, "\n6. Categories")?;
    let c = &r.categories;
    writeln!(out, "   a. Informational:  {}", c.informational)?;
    writeln!(out, "   b. Needs approval: {}", c.needs_approval)?;
    writeln!(out, "   c. Needs response: {}", c.needs_response)?;

    writeln!(out, "\n{rule}")
}

fn write_ranking(out: &mut String, ranked: &[RankedIdentity]) -> fmt::Result {
    if ranked.is_empty() {
        return writeln!(out, "   no data");
    }
    for (i, entry) in ranked.iter().enumerate() {
        writeln!(
            out,
            "   {}. {}: {} message{}",
            i + 1,
            entry.identity,
            entry.count,
            if entry.count == 1 { "" } else { "s" }
        )?;
    }
    Ok(())
}

pub fn render_json(r: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(r)?)
}
