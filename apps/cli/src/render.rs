//! Plain-text report rendering for `--format text`.

use pipelens_core::{Analysis, Funnel, FunnelStage};
use pipelens_ingest::{DataQualityReport, OptionalColumn, ResolvedColumns};

pub(crate) fn analysis(a: &Analysis) {
    println!();
    match &a.fingerprint {
        Some(fp) => println!("  Rows:        {} (source {})", a.rows, &fp[..12.min(fp.len())]),
        None => println!("  Rows:        {}", a.rows),
    }
    if a.is_empty() {
        println!("  No rows match the selected companies and months.");
        println!();
        return;
    }

    println!("  Companies:   {}", a.kpis.companies);
    println!("  Referrals:   {}", a.kpis.total_recommendations);
    println!("  Submissions: {}", a.kpis.total_submissions);
    println!("  Offers:      {}", a.kpis.total_offers);
    println!("  Mean offer rate: {:.1}%", a.kpis.mean_offer_rate);

    println!();
    println!(
        "  {:<24} {:>5} {:>5} {:>7} {:>7} {:>6} {:>7} {:>6}",
        "company", "recs", "subs", "doc%", "1st%", "offers", "offer%", "cycle"
    );
    for m in &a.metrics {
        println!(
            "  {:<24} {:>5} {:>5} {:>7.1} {:>7.1} {:>6} {:>7.1} {:>6}",
            m.company,
            m.recommendations,
            m.submissions,
            m.document_pass_rate,
            m.first_round_pass_rate,
            m.offers,
            m.offer_rate,
            m.avg_cycle_days
        );
    }

    println!();
    println!("  Top companies by score:");
    for r in &a.top {
        println!(
            "    {}. {} (score {:.1}, {} offers, {:.1}%)",
            r.rank, r.company, r.score, r.offers, r.offer_rate
        );
    }

    funnel(&a.funnel);

    if !a.alerts.is_empty() {
        println!("  Alerts:");
        for alert in &a.alerts {
            println!("    [{:?}] {}: {}", alert.priority, alert.company, alert.message);
        }
        println!();
    }

    for rec in &a.recommendations {
        println!("  {} ({})", rec.title, rec.companies.join(", "));
        for action in rec.actions {
            println!("    - {action}");
        }
    }

    let i = &a.insights;
    println!();
    if let Some(best) = &i.best_performer {
        println!("  Best performer: {} ({:.1}%)", best.company, best.offer_rate);
    }
    println!("  Companies under 10% offer rate: {}", i.low_offer_rate_companies);
    println!("  Companies over 30 days to offer: {}", i.slow_cycle_companies);
    println!(
        "  Overall: {} offers from {} submissions ({:.1}%)",
        i.total_offers, i.total_submissions, i.overall_offer_rate
    );

    for column in &a.unresolved_columns {
        println!("  (no {} column; related breakdowns skipped)", column.label());
    }
    println!();
}

pub(crate) fn funnel(f: &Funnel) {
    println!();
    match &f.company {
        Some(c) => println!("  Funnel for {c}:"),
        None => println!("  Funnel:"),
    }
    if f.is_empty() {
        println!("    (empty)");
    }
    for stage in FunnelStage::ALL {
        if let Some(count) = f.counts.get(&stage) {
            println!("    {:<18} {count:>6}", stage.label());
        }
    }
    for rate in &f.pass_rates {
        println!(
            "    {} -> {}: {:.1}%",
            rate.from.label(),
            rate.to.label(),
            rate.rate
        );
    }
    println!();
}

pub(crate) fn quality(report: &DataQualityReport, resolved: &ResolvedColumns) {
    let stats = &report.statistics;
    println!();
    println!("  Schema:        ok");
    println!("  Rows:          {}", stats.total_rows);
    println!("  Candidates:    {}", stats.unique_candidates);
    println!("  Companies:     {}", stats.unique_companies);
    println!(
        "  Completeness:  submitted {:.1}%, interviewed {:.1}%, offered {:.1}% (mean {:.1}%)",
        stats.completeness.submitted,
        stats.completeness.interviewed,
        stats.completeness.offered,
        stats.completeness.mean()
    );
    println!("  Duplicates:    {:.1}%", report.duplicate_rate);
    println!("  Quality score: {}/100", report.quality_score);

    println!();
    for column in OptionalColumn::ALL {
        match resolved.get(column) {
            Some(name) => println!("  {:<26} {name}", column.label()),
            None => println!("  {:<26} (not found)", column.label()),
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for warning in &report.warnings {
            println!("    - {warning}");
        }
    }
    println!();
}
