//! Checksum validators for Russian identifiers and bank cards
//!
//! Every validator takes the raw span text (spaces, hyphens and other
//! formatting are ignored) and answers with a plain `bool`. Nothing here
//! panics or returns an error: input that cannot be interpreted fails the
//! check.

use super::text::digits_of;

/// Weights of the bank account control sum, `[7, 1, 3]` cycled over 23
/// positions.
const ACCOUNT_WEIGHTS: [u32; 23] = [
    7, 1, 3, 7, 1, 3, 7, 1, 3, 7, 1, 3, 7, 1, 3, 7, 1, 3, 7, 1, 3, 7, 1,
];

const INN10_WEIGHTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_WEIGHTS_1: [u32; 11] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8, 0];
const INN12_WEIGHTS_2: [u32; 12] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8, 0];

fn digit_values(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn weighted_sum(digits: &[u32], weights: &[u32]) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

/// Luhn (mod 10) check used for bank card PANs.
///
/// ```
/// use ru_pii_guard::privacy::checksum::luhn_ok;
///
/// assert!(luhn_ok("4111 1111 1111 1111"));
/// assert!(!luhn_ok("4111 1111 1111 1112"));
/// ```
pub fn luhn_ok(num: &str) -> bool {
    let digits = digit_values(num);
    if digits.is_empty() {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// SNILS: 9-digit base followed by a 2-digit control number.
pub fn snils_checksum_ok(snils: &str) -> bool {
    let digits = digit_values(snils);
    if digits.len() != 11 {
        return false;
    }

    let (base, check) = digits.split_at(9);
    let check = check[0] * 10 + check[1];
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(i, d)| d * (9 - i as u32))
        .sum();

    match sum {
        s if s < 100 => check == s,
        100 | 101 => check == 0,
        s => check == (s % 101) % 100,
    }
}

/// INN: 10 digits for organizations, 12 for individuals.
pub fn inn_checksum_ok(inn: &str) -> bool {
    let d = digit_values(inn);
    match d.len() {
        10 => weighted_sum(&d[..9], &INN10_WEIGHTS) % 11 % 10 == d[9],
        12 => {
            let c1 = weighted_sum(&d[..10], &INN12_WEIGHTS_1) % 11 % 10;
            let c2 = weighted_sum(&d[..11], &INN12_WEIGHTS_2) % 11 % 10;
            c1 == d[10] && c2 == d[11]
        }
        _ => false,
    }
}

/// OGRN (13 digits) and OGRNIP (15 digits).
///
/// The leading digits are reduced mod 11 incrementally, so no width limit
/// applies to the intermediate number.
pub fn ogrn_checksum_ok(ogrn: &str) -> bool {
    let d = digit_values(ogrn);
    if d.len() != 13 && d.len() != 15 {
        return false;
    }

    let (body, check) = d.split_at(d.len() - 1);
    let rem = body.iter().fold(0u32, |acc, &digit| (acc * 10 + digit) % 11);
    rem % 10 == check[0]
}

/// BIK structural check: exactly 9 digits, not all zero.
pub fn bik_ok(bik: &str) -> bool {
    let d = digits_of(bik);
    d.len() == 9 && d.bytes().any(|b| b != b'0')
}

/// Control sum of a 20-digit bank account against a 9-digit BIK.
///
/// The control string is 23 characters: for a correspondent account
/// `"0"` + BIK digits 5–6 + account, for a settlement account BIK digits
/// 7–9 + account. Malformed input fails.
pub fn account_checksum_ok(account: &str, bik: &str, is_corr: bool) -> bool {
    let acc = digits_of(account);
    let b = digits_of(bik);
    if acc.len() != 20 || b.len() != 9 {
        return false;
    }

    let control = if is_corr {
        format!("0{}{}", &b[4..6], acc)
    } else {
        format!("{}{}", &b[6..9], acc)
    };
    if control.len() != ACCOUNT_WEIGHTS.len() {
        return false;
    }

    let total = weighted_sum(&digit_values(&control), &ACCOUNT_WEIGHTS);
    total % 10 == 0
}

/// Every maximal run of exactly 9 digits in `text`, in order of appearance.
///
/// Entity boundaries are ignored: the BIK an account belongs to may sit
/// anywhere in the text.
pub fn find_all_biks(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut run = String::new();

    for ch in text.chars() {
        if ch.is_ascii_digit() {
            run.push(ch);
            continue;
        }
        if run.len() == 9 {
            out.push(std::mem::take(&mut run));
        } else {
            run.clear();
        }
    }
    if run.len() == 9 {
        out.push(run);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luhn() {
        assert!(luhn_ok("4111111111111111"));
        assert!(!luhn_ok("4111111111111112"));
        assert!(luhn_ok("4111 1111 1111 1111"));
        assert!(luhn_ok("5500-0000-0000-0004"));
        assert!(!luhn_ok(""));
        assert!(!luhn_ok("card"));
    }

    #[test]
    fn test_luhn_single_digit_flip() {
        let valid = "4539148803436467";
        assert!(luhn_ok(valid));
        let mut failures = 0;
        let mut total = 0;
        for pos in 0..valid.len() {
            for replacement in b'0'..=b'9' {
                let mut bytes = valid.as_bytes().to_vec();
                if bytes[pos] == replacement {
                    continue;
                }
                bytes[pos] = replacement;
                total += 1;
                if !luhn_ok(std::str::from_utf8(&bytes).unwrap()) {
                    failures += 1;
                }
            }
        }
        assert_eq!(failures, total);
    }

    #[test]
    fn test_snils() {
        assert!(snils_checksum_ok("112-233-445 95"));
        assert!(snils_checksum_ok("11223344595"));
        assert!(!snils_checksum_ok("112-233-445 96"));
        assert!(!snils_checksum_ok("123-456-789"));
    }

    #[test]
    fn test_snils_sum_boundaries() {
        // 9 + 5 + 32 + 27 + 18 + 9 = 100
        assert!(snils_checksum_ok("100-018-999 00"));
        assert!(!snils_checksum_ok("100-018-999 01"));
        assert!(!snils_checksum_ok("100-018-999 100"));
        // sum 101
        assert!(snils_checksum_ok("100-019-899 00"));
        assert!(!snils_checksum_ok("100-019-899 01"));
    }

    #[test]
    fn test_inn_dispatch_by_length() {
        assert!(inn_checksum_ok("7736050003"));
        assert!(inn_checksum_ok("7707083893"));
        assert!(!inn_checksum_ok("7736050004"));
        assert!(inn_checksum_ok("500100732259"));
        assert!(!inn_checksum_ok("500100732250"));
        assert!(!inn_checksum_ok("50010073225"));
        assert!(!inn_checksum_ok("77360500031"));
        assert!(!inn_checksum_ok(""));
    }

    #[test]
    fn test_ogrn() {
        assert!(ogrn_checksum_ok("1027700132195"));
        assert!(!ogrn_checksum_ok("1027700132196"));
        assert!(ogrn_checksum_ok("304500116000157"));
        assert!(!ogrn_checksum_ok("304500116000158"));
        assert!(!ogrn_checksum_ok("10277001321950"));
    }

    #[test]
    fn test_bik() {
        assert!(bik_ok("044525225"));
        assert!(!bik_ok("000000000"));
        assert!(!bik_ok("04452522"));
        assert!(!bik_ok("0445252250"));
    }

    #[test]
    fn test_account_requires_matching_bik() {
        assert!(account_checksum_ok("40702810200000000001", "044525225", false));
        assert!(!account_checksum_ok("40702810200000000001", "044030653", false));
        assert!(!account_checksum_ok("40702810900000000001", "044525225", false));
        assert!(account_checksum_ok("40702810500000001234", "044525225", false));
    }

    #[test]
    fn test_correspondent_account() {
        assert!(account_checksum_ok("30101810400000000225", "044525225", true));
        assert!(!account_checksum_ok("30101810400000000225", "044525225", false));
        assert!(!account_checksum_ok("30101810400000000225", "044030653", true));
    }

    #[test]
    fn test_account_malformed_fails_closed() {
        assert!(!account_checksum_ok("4070281020000000000", "044525225", false));
        assert!(!account_checksum_ok("40702810200000000001", "04452522", false));
        assert!(!account_checksum_ok("", "", true));
    }

    #[test]
    fn test_find_all_biks() {
        let text = "БИК 044525225, р/с 40702810200000000001, 123456789";
        assert_eq!(find_all_biks(text), vec!["044525225", "123456789"]);
        assert!(find_all_biks("0445252251").is_empty());
        assert!(find_all_biks("no digits").is_empty());
    }
}
