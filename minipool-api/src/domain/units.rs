use web3::types::U256;

/// Number of decimals in one ether
pub const ETH_DECIMALS: usize = 18;

/// Whole ethers expressed in wei
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(ETH_DECIMALS)
}

/// Renders a wei amount as ether rounded to two decimals, e.g. `16.00`
pub fn format_eth(wei: U256) -> String {
    let cent = U256::exp10(ETH_DECIMALS - 2);
    let cents = wei.saturating_add(cent / 2) / cent;
    let whole = cents / 100;
    let frac = (cents % 100).low_u64();
    format!("{whole}.{frac:02}")
}
