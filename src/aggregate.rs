//! Normalization of raw repository data into a [`StatsSummary`].
//!
//! Everything here is pure: the sources hand over what they fetched and the
//! current time, and get back the summary the caller will see.

use crate::age::relative_age;
use crate::stats::{
    ActivityEntry, ActivityKind, ContributionTotals, LanguageShare, RawRepository, RichProfile,
    StatsSummary,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Accent used when no better color is known for a language.
pub const NEUTRAL_COLOR: &str = "#8b5cf6";

/// Contribution totals below this are considered under-reported.
pub const COMMIT_THRESHOLD: u64 = 10;

/// Commits assumed per repository when the commit search is unavailable.
pub const COMMITS_PER_REPO_ESTIMATE: u64 = 8;

pub const MAX_LANGUAGES: usize = 5;
pub const MAX_ACTIVITY: usize = 4;

/// Display colors of well-known languages.
const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("JavaScript", "#f7df1e"),
    ("TypeScript", "#3178c6"),
    ("Python", "#3776ab"),
    ("Java", "#ed8b00"),
    ("C++", "#00599c"),
    ("C", "#a8b9cc"),
    ("C#", "#239120"),
    ("PHP", "#777bb4"),
    ("Ruby", "#cc342d"),
    ("Go", "#00add8"),
    ("Rust", "#dea584"),
    ("Swift", "#fa7343"),
    ("Kotlin", "#7f52ff"),
    ("HTML", "#e34c26"),
    ("CSS", "#1572b6"),
    ("Shell", "#89e051"),
    ("Dockerfile", "#384d54"),
    ("Vue", "#4fc08d"),
    ("React", "#61dafb"),
    ("Svelte", "#ff3e00"),
];

/// How language colors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPolicy {
    /// Fixed table first, then the color the source reported, then neutral.
    Lookup,
    /// Neutral accent for every language.
    Neutral,
}

pub fn known_color(language: &str) -> Option<&'static str> {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, color)| *color)
}

pub fn total_stars(repos: &[RawRepository]) -> u64 {
    repos.iter().fold(0u64, |acc, r| acc.saturating_add(r.star_count))
}

pub fn total_forks(repos: &[RawRepository]) -> u64 {
    repos.iter().fold(0u64, |acc, r| acc.saturating_add(r.fork_count))
}

/// Commit total for the rich source.
///
/// Uses the contribution totals unless they add up to less than
/// [`COMMIT_THRESHOLD`], in which case the per-repository history counts are
/// summed instead (repositories without a count contribute 0).
pub fn rich_commit_total(contributions: &ContributionTotals, repos: &[RawRepository]) -> u64 {
    let reported = contributions.sum();
    if reported >= COMMIT_THRESHOLD {
        return reported;
    }

    repos
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.commit_count.unwrap_or(0)))
}

/// Crude commit estimate used when the commit search fails.
pub fn estimated_commit_total(repo_count: usize) -> u64 {
    (repo_count as u64).saturating_mul(COMMITS_PER_REPO_ESTIMATE)
}

/// Share of repositories per primary language, top [`MAX_LANGUAGES`].
///
/// Repositories without a language are left out of both the grouping and the
/// denominator. Percentages are rounded independently and need not add up to
/// 100. Ties keep the order in which languages were first seen.
pub fn language_breakdown(repos: &[RawRepository], policy: ColorPolicy) -> Vec<LanguageShare> {
    // (name, count, color reported by the first repository using it)
    let mut groups: Vec<(&str, u64, Option<&str>)> = Vec::new();

    for lang in repos.iter().filter_map(|r| r.primary_language.as_ref()) {
        match groups.iter_mut().find(|(name, _, _)| *name == lang.name) {
            Some(group) => group.1 += 1,
            None => groups.push((lang.name.as_str(), 1, lang.color.as_deref())),
        }
    }

    let with_language: u64 = groups.iter().map(|(_, count, _)| count).sum();
    if with_language == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LanguageShare> = groups
        .into_iter()
        .map(|(name, count, reported_color)| {
            let color = match policy {
                ColorPolicy::Lookup => known_color(name).or(reported_color).unwrap_or(NEUTRAL_COLOR),
                ColorPolicy::Neutral => NEUTRAL_COLOR,
            };

            LanguageShare {
                name: name.to_string(),
                percentage: percentage(count, with_language),
                color: color.to_string(),
            }
        })
        .collect();

    // sort_by is stable, so equal percentages keep discovery order
    shares.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    shares.truncate(MAX_LANGUAGES);
    shares
}

fn percentage(count: u64, total: u64) -> u8 {
    let pct = ((count as f64 / total as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

fn push_entry(repo: &RawRepository, pushed_at: DateTime<Utc>, now: DateTime<Utc>) -> ActivityEntry {
    ActivityEntry {
        kind: ActivityKind::Push,
        repo: repo.name.clone(),
        date: relative_age(pushed_at, now),
    }
}

/// Recent pushes, trusting the source's most-recently-updated-first order.
pub fn recent_activity_in_source_order(
    repos: &[RawRepository],
    now: DateTime<Utc>,
) -> Vec<ActivityEntry> {
    repos
        .iter()
        .filter_map(|r| r.last_pushed_at.map(|at| push_entry(r, at, now)))
        .take(MAX_ACTIVITY)
        .collect()
}

/// Recent pushes, ordered by push time, newest first.
pub fn recent_activity_by_push_time(
    repos: &[RawRepository],
    now: DateTime<Utc>,
) -> Vec<ActivityEntry> {
    let mut pushed: Vec<(&RawRepository, DateTime<Utc>)> = repos
        .iter()
        .filter_map(|r| r.last_pushed_at.map(|at| (r, at)))
        .collect();
    pushed.sort_by_key(|(_, at)| Reverse(*at));

    pushed
        .into_iter()
        .take(MAX_ACTIVITY)
        .map(|(r, at)| push_entry(r, at, now))
        .collect()
}

/// Builds the summary for data fetched from the GraphQL source.
pub fn summarize_rich(profile: &RichProfile, now: DateTime<Utc>) -> StatsSummary {
    let repos = &profile.repositories;
    StatsSummary {
        total_repos: profile.total_repos,
        total_stars: total_stars(repos),
        total_forks: total_forks(repos),
        total_commits: rich_commit_total(&profile.contributions, repos),
        languages: language_breakdown(repos, ColorPolicy::Lookup),
        recent_activity: recent_activity_in_source_order(repos, now),
    }
}

/// Builds the summary for data fetched from the REST source.
///
/// `commit_count` is `None` when the commit search failed; the estimate from
/// [`estimated_commit_total`] is used in that case.
pub fn summarize_simple(
    public_repos: u64,
    repos: &[RawRepository],
    commit_count: Option<u64>,
    now: DateTime<Utc>,
) -> StatsSummary {
    StatsSummary {
        total_repos: public_repos,
        total_stars: total_stars(repos),
        total_forks: total_forks(repos),
        total_commits: commit_count.unwrap_or_else(|| estimated_commit_total(repos.len())),
        languages: language_breakdown(repos, ColorPolicy::Neutral),
        recent_activity: recent_activity_by_push_time(repos, now),
    }
}
