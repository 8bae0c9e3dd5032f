//! The assembled profile figures and their display rendering.

use std::fmt;

use time::{
    Date, Month, OffsetDateTime, format_description::well_known::Rfc3339,
    util::days_in_year_month,
};

use crate::{cache::LocTotals, svg::SlotValues};

/// Everything a refresh computes, ready to render into the templates.
#[derive(Debug, Clone)]
pub struct ProfileStats {
    /// Calendar age of the account.
    pub age: AccountAge,
    /// Stargazers across owned repositories.
    pub stars: i64,
    /// Owned repositories.
    pub owned_repos: i64,
    /// Repositories contributed to (including archived ones).
    pub contributed_repos: i64,
    /// Issues opened.
    pub issues: i64,
    /// Pull requests opened.
    pub pull_requests: i64,
    /// Commit and LOC figures (cache plus archive).
    pub loc: LocTotals,
    /// Whether the refresh served every repository from the cache.
    pub cache_hit: bool,
}

impl ProfileStats {
    /// Render the figures into their template slots.
    pub fn slot_values(&self) -> SlotValues {
        SlotValues {
            age: self.age.to_string(),
            repos: group_thousands(self.owned_repos),
            contributed: group_thousands(self.contributed_repos),
            stars: group_thousands(self.stars),
            commits: group_thousands(self.loc.commits),
            issues: group_thousands(self.issues),
            pull_requests: group_thousands(self.pull_requests),
            net_loc: group_thousands(self.loc.net()),
            added_loc: format!("{}++", group_thousands(self.loc.added)),
            deleted_loc: format!("{}--", group_thousands(self.loc.deleted)),
        }
    }
}

/// Calendar difference between account creation and today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountAge {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl fmt::Display for AccountAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} year{}, {} month{}, {} day{}",
            self.years,
            plural(self.years),
            self.months,
            plural(self.months),
            self.days,
            plural(self.days)
        )
    }
}

fn plural(value: i32) -> &'static str {
    if value == 1 { "" } else { "s" }
}

/// Parse GitHub's `createdAt` timestamp (Rfc3339).
pub fn parse_created_at(timestamp: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(timestamp, &Rfc3339)
}

/// Calendar-aware difference between two dates, borrowing days from the month
/// preceding `today` when needed.
pub fn account_age(created: Date, today: Date) -> AccountAge {
    let mut years = today.year() - created.year();
    let mut months = i32::from(u8::from(today.month())) - i32::from(u8::from(created.month()));
    let mut days = i32::from(today.day()) - i32::from(created.day());

    if days < 0 {
        let prev_month = today.month().previous();
        let prev_year = if today.month() == Month::January {
            today.year() - 1
        } else {
            today.year()
        };
        days += i32::from(days_in_year_month(prev_year, prev_month));
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    AccountAge { years, months, days }
}

/// Group a number with thousands separators.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && index % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45678), "-45,678");
    }

    #[test]
    fn age_on_anniversary_is_exact_years() {
        let age = account_age(date!(2016 - 03 - 10), date!(2024 - 03 - 10));
        assert_eq!(
            age,
            AccountAge {
                years: 8,
                months: 0,
                days: 0
            }
        );
    }

    #[test]
    fn age_borrows_days_from_previous_month() {
        // 2016-01-31 -> 2016-03-01: February 2016 had 29 days.
        let age = account_age(date!(2016 - 01 - 31), date!(2016 - 03 - 01));
        assert_eq!(
            age,
            AccountAge {
                years: 0,
                months: 1,
                days: 1
            }
        );
    }

    #[test]
    fn age_borrows_months_across_year_boundary() {
        let age = account_age(date!(2019 - 11 - 20), date!(2020 - 01 - 05));
        assert_eq!(
            age,
            AccountAge {
                years: 0,
                months: 1,
                days: 16
            }
        );
    }

    #[test]
    fn age_display_pluralizes() {
        let age = AccountAge {
            years: 1,
            months: 0,
            days: 21
        };
        assert_eq!(age.to_string(), "1 year, 0 months, 21 days");
    }

    #[test]
    fn created_at_parses_github_timestamps() {
        let parsed = parse_created_at("2016-03-10T18:30:00Z").unwrap();
        assert_eq!(parsed.date(), date!(2016 - 03 - 10));
        assert!(parse_created_at("not-a-timestamp").is_err());
    }

    #[test]
    fn slot_values_carry_loc_suffixes() {
        let stats = ProfileStats {
            age: AccountAge {
                years: 2,
                months: 3,
                days: 4
            },
            stars: 1204,
            owned_repos: 24,
            contributed_repos: 31,
            issues: 87,
            pull_requests: 162,
            loc: LocTotals {
                added: 240001,
                deleted: 57447,
                commits: 4512,
            },
            cache_hit: true,
        };
        let values = stats.slot_values();
        assert_eq!(values.added_loc, "240,001++");
        assert_eq!(values.deleted_loc, "57,447--");
        assert_eq!(values.net_loc, "182,554");
        assert_eq!(values.commits, "4,512");
        assert_eq!(values.age, "2 years, 3 months, 4 days");
    }
}
