use crate::stats::*;
use crate::timefmt::format_peak_date;
use anyhow::Result;
use unicode_width::UnicodeWidthStr;

const BAR_WIDTH: u32 = 30;

/// Render the dashboard to Markdown
pub fn render(dashboard: &Dashboard) -> Result<String> {
    let mut output = String::new();

    // 1. Title and account
    render_header(&mut output, dashboard);

    // 2. Sent
    render_section(&mut output, &dashboard.sent, "💗");

    // 3. Received, or how to get there
    match dashboard.received {
        Some(ref received) => render_section(&mut output, received, "🎁"),
        None => render_connect_hint(&mut output),
    }

    Ok(output)
}

fn render_header(output: &mut String, dashboard: &Dashboard) {
    let account = &dashboard.account;

    match account.display_name {
        Some(ref name) => output.push_str(&format!("# 💓 The Love Meter — {}\n", name)),
        None => output.push_str("# 💓 The Love Meter\n"),
    }
    output.push_str(
        "*A little counter for every time you cross my mind, and every time I cross yours.*\n\n",
    );

    output.push_str(&format!("- **User ID:** {}\n", account.user_id));
    if let Some(ref partner) = dashboard.partner {
        output.push_str(&format!(
            "- **Partner:** {}\n",
            partner.display_name.as_deref().unwrap_or(&partner.user_id)
        ));
    }
    output.push_str(&format!(
        "- **Generated:** {} ({})\n",
        dashboard.generated_at, dashboard.zone
    ));
    output.push_str(&format!("- **Counting since:** {}\n", dashboard.cutoff));
    output.push('\n');
}

fn render_section(output: &mut String, section: &Section, icon: &str) {
    output.push_str(&format!("## {} {}\n", icon, section.title));
    render_counters(output, &section.stats);
    render_peak_day(output, &section.stats.peak_day);
    render_weekly(output, &section.weekly);
}

fn render_counters(output: &mut String, stats: &StatsSnapshot) {
    output.push_str("| Today | This Week | This Month | This Year |\n");
    output.push_str("| ----- | --------- | ---------- | --------- |\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        format_number(stats.today as i64),
        format_number(stats.this_week as i64),
        format_number(stats.this_month as i64),
        format_number(stats.this_year as i64)
    ));
}

fn render_peak_day(output: &mut String, peak: &PeakDay) {
    if peak.is_none() {
        output.push_str("⚡ **Peak day:** N/A\n\n");
    } else {
        output.push_str(&format!(
            "⚡ **Peak day:** {} clicks on {}\n\n",
            format_number(peak.count as i64),
            format_peak_date(peak.date)
        ));
    }
}

fn render_weekly(output: &mut String, weekly: &WeeklySeries) {
    output.push_str(&format!("#### 📊 Weekly dashboard ({})\n", weekly.label_key));
    output.push_str("```\n");

    let label_width = weekly
        .points
        .iter()
        .map(|p| UnicodeWidthStr::width(p.label.as_str()))
        .max()
        .unwrap_or(0);
    let max = weekly.max_count();

    for point in &weekly.points {
        let padding = label_width - UnicodeWidthStr::width(point.label.as_str());
        output.push_str(&point.label);
        output.push_str(&" ".repeat(padding));
        output.push_str(" | ");
        output.push_str(&"█".repeat(bar_length(point.count, max) as usize));
        output.push_str(&format!(" {}\n", point.count));
    }
    output.push_str("```\n\n");
}

fn render_connect_hint(output: &mut String) {
    output.push_str("## 🔗 Connect with your partner\n");
    output.push_str(
        "To see the thoughts they send you, link their User ID with \
         `lovemeter link --partner <id>`. They must do the same with your ID.\n",
    );
}

/// Bar length scaled to the largest count; any non-zero count gets at least one cell
fn bar_length(count: u32, max: u32) -> u32 {
    if count == 0 || max == 0 {
        return 0;
    }
    ((count as u64 * BAR_WIDTH as u64) / max as u64).max(1) as u32
}

/// Format a number with thousands separators
pub fn format_number(n: i64) -> String {
    let is_negative = n < 0;
    let abs_str = n.unsigned_abs().to_string();
    let mut grouped_rev = String::new();

    // Insert commas every three digits, starting from the right
    for (count, ch) in abs_str.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    let mut formatted: String = grouped_rev.chars().rev().collect();
    if is_negative {
        formatted.insert(0, '-');
    }
    formatted
}
