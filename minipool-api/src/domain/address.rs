use web3::signing::keccak256;
use web3::types::Address;

/// EIP-55 mixed-case form of the address, e.g. `0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed`
pub fn to_checksum(address: &Address) -> String {
    let lower: String = address
        .as_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    let hash = keccak256(lower.as_bytes());
    let mut res = String::with_capacity(42);
    res.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if nibble >= 8 {
            res.push(c.to_ascii_uppercase());
        } else {
            res.push(c);
        }
    }
    res
}
