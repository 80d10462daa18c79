use std::fmt::Write;

use crate::engine::ComparisonReport;
use crate::scoring::Evaluation;

pub fn build_report(report: &ComparisonReport, evaluation: &Evaluation) -> String {
    let mut output = String::new();
    let me = &report.researcher.researcher;
    let period = match &report.range {
        Some(range) => format!("{} to {}", range.start, range.end),
        None => "all recorded activity".to_string(),
    };

    let _ = writeln!(output, "# Researcher Performance Report");
    let _ = writeln!(
        output,
        "{} ({}, {} / {}), {}",
        me.name, me.academic_title, me.college, me.department, period
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Evaluation");
    let _ = writeln!(output, "Score: {}/100", evaluation.score);
    for item in evaluation.breakdown.iter().filter(|item| item.count > 0 || item.goal.is_some()) {
        let goal = match (item.goal, item.achievement_percent) {
            (Some(goal), Some(percent)) => format!(", goal {goal} ({percent}% achieved)"),
            (Some(goal), None) => format!(", goal {goal}"),
            _ => String::new(),
        };
        let _ = writeln!(
            output,
            "- {}: {} of {} ({:.1} pts){}",
            item.category.label(),
            item.count,
            item.cap,
            item.contribution,
            goal
        );
    }

    let strongest: Vec<&str> = evaluation
        .strongest(3)
        .into_iter()
        .filter(|item| item.contribution > 0.0)
        .map(|item| item.category.label())
        .collect();
    if !strongest.is_empty() {
        let _ = writeln!(output, "Strongest: {}", strongest.join(", "));
    }
    let weakest: Vec<&str> = evaluation
        .weakest(3)
        .into_iter()
        .map(|item| item.category.label())
        .collect();
    let _ = writeln!(output, "Most room to grow: {}", weakest.join(", "));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Standing");
    let ranks = &report.ranks;
    let averages = &report.averages;
    let _ = writeln!(
        output,
        "- University: #{} of {} (top {}%), average {:.0}",
        ranks.university.rank, ranks.university.size, ranks.university.top_percent, averages.university
    );
    let _ = writeln!(
        output,
        "- College: #{} of {} (top {}%), average {:.0}",
        ranks.college.rank, ranks.college.size, ranks.college.top_percent, averages.college
    );
    let _ = writeln!(
        output,
        "- Department: #{} of {} (top {}%), average {:.0}",
        ranks.department.rank, ranks.department.size, ranks.department.top_percent, averages.department
    );
    let _ = writeln!(output, "- Comparison points: {:.0}", report.researcher.score);

    if !report.badges.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Badges");
        for badge in &report.badges {
            let _ = writeln!(output, "- {}", badge.label());
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Metric Leaderboards");
    for board in &report.leaderboards {
        let leader = board
            .top
            .first()
            .map(|row| format!("{} ({:.0})", row.name, row.points))
            .unwrap_or_else(|| "nobody yet".to_string());
        let _ = writeln!(
            output,
            "- {}: you are #{} of {} with {:.0} pts; leader {}",
            board.metric.label(),
            board.my_rank,
            board.cohort_size,
            board.my_points,
            leader
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Similar Researchers");
    if report.similar.is_empty() {
        let _ = writeln!(output, "Not enough data to find similar researchers.");
    } else {
        for peer in &report.similar {
            let tags: Vec<&str> = peer.shared_tags.iter().map(|tag| tag.label()).collect();
            let _ = writeln!(
                output,
                "- {} ({}, {}) {:.0} pts, distance {:.0}{}",
                peer.name,
                peer.academic_title,
                peer.college,
                peer.score,
                peer.distance,
                if tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", tags.join(", "))
                }
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activity Trends");
    let trends = &report.trends;
    for bucket in &trends.yearly {
        let _ = writeln!(
            output,
            "- {}{}: {:.0} pts across {} activities",
            bucket.year,
            if bucket.is_current { " (current)" } else { "" },
            bucket.points,
            bucket.activity_count
        );
    }
    match (trends.best_year, trends.best_month) {
        (None, None) => {
            let _ = writeln!(output, "No dated activity yet.");
        }
        (best_year, best_month) => {
            if let Some(year) = best_year {
                let _ = writeln!(output, "Best year: {year}");
            }
            if let Some(month) = best_month {
                let _ = writeln!(output, "Best month of {}: {month}", trends.year);
            }
        }
    }

    let step = &report.next_step;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Next Step");
    let _ = writeln!(
        output,
        "Focus on {}: {:.0} more points would move you from #{} to #{} in your college (estimated gain {}).",
        step.focus.label(),
        step.projected_score - step.current_score,
        step.current_college_rank,
        step.projected_college_rank,
        step.estimated_college_rank_gain
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::config::ScoringConfig;
    use crate::engine::{ComparisonFilters, ScoringEngine};
    use crate::ledger::MemoryLedger;
    use crate::test_support::{date, record, researcher};

    #[tokio::test]
    async fn report_covers_every_section() {
        let me = researcher("Layla Haddad", "Engineering", "Civil", "Professor");
        let peer = researcher("Omar Saleh", "Engineering", "Electrical", "Professor");
        let ledger = MemoryLedger::new(
            vec![me.clone(), peer.clone()],
            vec![
                record(me.id, Category::Research, date(2025, 3, 1)),
                record(peer.id, Category::Research, date(2025, 4, 1)),
            ],
        );
        let engine = ScoringEngine::new(ledger, ScoringConfig::default());
        let comparison = engine
            .comparison_data(me.id, ComparisonFilters { range: None, year: 2025 })
            .await
            .expect("read succeeds")
            .expect("active researcher");
        let evaluation = engine.evaluation_score(me.id, None).await.expect("read succeeds");

        let text = build_report(&comparison, &evaluation);
        assert!(text.contains("# Researcher Performance Report"));
        assert!(text.contains("Score: 3/100"));
        assert!(text.contains("Strongest: Research outputs"));
        assert!(text.contains("Most room to grow: Research outputs"));
        assert!(text.contains("- University: #1 of 2"));
        assert!(text.contains("Top 3 in the university"));
        assert!(text.contains("Omar Saleh"));
        assert!(text.contains("Best year: 2025"));
        assert!(text.contains("## Next Step"));
    }

    #[tokio::test]
    async fn lone_researcher_report_explains_missing_peers() {
        let me = researcher("Nadia Karim", "Science", "Chemistry", "Lecturer");
        let engine = ScoringEngine::new(
            MemoryLedger::new(vec![me.clone()], Vec::new()),
            ScoringConfig::default(),
        );
        let comparison = engine
            .comparison_data(me.id, ComparisonFilters { range: None, year: 2025 })
            .await
            .expect("read succeeds")
            .expect("active researcher");
        let evaluation = engine.evaluation_score(me.id, None).await.expect("read succeeds");

        let text = build_report(&comparison, &evaluation);
        assert!(text.contains("Not enough data to find similar researchers."));
        assert!(text.contains("No dated activity yet."));
    }
}
