use minipool_api::domain::{to_checksum, MinipoolState, MinipoolStatus};
use regex::Regex;
use std::io::Write;
use tokio::io::AsyncBufRead;
use web3::types::Address;

use crate::console::Console;
use crate::error::{Error, Result};

pub const SELECTION_PROMPT: &str = "Please select a minipool to withdraw from by entering a number, or enter 'A' for all (excluding initialized):";
pub const SELECTION_RETRY: &str =
    "Please enter a minipool number or 'A' for all (excluding initialized)";

/// Operator choice among the withdrawable minipools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 1-based position in the menu
    Single(usize),
    /// Every listed minipool except the initialized ones
    All,
}

/// Minipools whose node deposit can be withdrawn, in input order
pub fn withdrawable(statuses: &[MinipoolStatus]) -> Vec<MinipoolStatus> {
    statuses
        .iter()
        .filter(|s| s.is_withdrawable())
        .cloned()
        .collect()
}

/// Prompt text followed by one `n: address (state)` line per minipool
pub fn menu(eligible: &[MinipoolStatus]) -> String {
    let mut text = SELECTION_PROMPT.to_owned();
    for (i, status) in eligible.iter().enumerate() {
        text.push_str(&format!(
            "\n{}: {} ({})",
            i + 1,
            to_checksum(&status.address),
            status.label()
        ));
    }
    text
}

/// Matches `1`..=`count` and, ignoring case, `a` or `all`
pub fn selection_pattern(count: usize) -> Result<Regex> {
    let mut options: Vec<String> = (1..=count).map(|i| i.to_string()).collect();
    options.push("a".to_owned());
    options.push("all".to_owned());
    Ok(Regex::new(&format!("^(?i:{})$", options.join("|")))?)
}

pub fn parse_selection(input: &str, count: usize) -> Result<Selection> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("a") || input.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    let invalid = || Error::InvalidSelection(input.to_owned());
    if input.is_empty() || input.starts_with('0') || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let index: usize = input.parse().map_err(|_| invalid())?;
    if index > count {
        return Err(invalid());
    }
    Ok(Selection::Single(index))
}

/// Addresses to withdraw from. Initialized minipools are only withdrawn when
/// picked individually.
pub fn resolve(eligible: &[MinipoolStatus], selection: Selection) -> Vec<Address> {
    match selection {
        Selection::Single(index) => eligible
            .get(index.wrapping_sub(1))
            .map(|s| vec![s.address])
            .unwrap_or_default(),
        Selection::All => eligible
            .iter()
            .filter(|s| s.state != MinipoolState::Initialized)
            .map(|s| s.address)
            .collect(),
    }
}

/// Shows the menu and blocks until the operator gives a valid answer
pub async fn prompt_selection<R: AsyncBufRead + Unpin, W: Write>(
    console: &mut Console<R, W>,
    eligible: &[MinipoolStatus],
) -> Result<Selection> {
    let pattern = selection_pattern(eligible.len())?;
    let answer = console
        .prompt(&menu(eligible), &pattern, SELECTION_RETRY)
        .await?;
    parse_selection(&answer, eligible.len())
}
