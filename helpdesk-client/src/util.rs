use chrono::Utc;

use crate::api::Time;

/// Human "time ago" label for a comment timestamp. Display only; ordering
/// always comes from the server's list order.
pub fn time_ago(t: Time) -> String {
    let elapsed = Utc::now().signed_duration_since(t);
    if elapsed < chrono::Duration::zero() {
        // clock skew between client and server
        return String::from("just now");
    }
    match elapsed {
        d if d < chrono::Duration::minutes(1) => String::from("just now"),
        d if d < chrono::Duration::hours(1) => plural(d.num_minutes(), "minute"),
        d if d < chrono::Duration::days(1) => plural(d.num_hours(), "hour"),
        d if d < chrono::Duration::days(30) => plural(d.num_days(), "day"),
        d if d < chrono::Duration::days(365) => plural(d.num_days() / 30, "month"),
        d => plural(d.num_days() / 365, "year"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    match n {
        1 => format!("1 {unit} ago"),
        n => format!("{n} {unit}s ago"),
    }
}
