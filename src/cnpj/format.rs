//! CNPJ and CPF format validation (mod-11 check digits).

use std::fmt;

/// Error returned when a CNPJ or CPF fails format validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnpjFormatError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: String,
}

impl fmt::Display for CnpjFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tax id '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for CnpjFormatError {}

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip the usual punctuation ("11.222.333/0001-81" → "11222333000181").
pub fn normalize_cnpj(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CNPJ, with or without punctuation.
///
/// Returns the 14 bare digits on success.
pub fn validate_cnpj(value: &str) -> Result<String, CnpjFormatError> {
    let digits = checked_digits(value, 14)?;
    let d1 = check_digit(&digits[..12], &CNPJ_WEIGHTS_1);
    let d2 = check_digit(&digits[..13], &CNPJ_WEIGHTS_2);
    if digits[12] != d1 || digits[13] != d2 {
        return Err(CnpjFormatError {
            value: value.into(),
            reason: "check digits do not match".into(),
        });
    }
    Ok(to_string(&digits))
}

/// Validate a CPF, with or without punctuation.
///
/// Returns the 11 bare digits on success.
pub fn validate_cpf(value: &str) -> Result<String, CnpjFormatError> {
    let digits = checked_digits(value, 11)?;
    let w1: Vec<u32> = (2..=10).rev().collect();
    let w2: Vec<u32> = (2..=11).rev().collect();
    let d1 = check_digit(&digits[..9], &w1);
    let d2 = check_digit(&digits[..10], &w2);
    if digits[9] != d1 || digits[10] != d2 {
        return Err(CnpjFormatError {
            value: value.into(),
            reason: "check digits do not match".into(),
        });
    }
    Ok(to_string(&digits))
}

/// Render a CNPJ as `NN.NNN.NNN/NNNN-NN`. Input must already be 14 digits.
pub fn format_cnpj(digits: &str) -> Option<String> {
    if digits.len() != 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    ))
}

fn checked_digits(value: &str, expected: usize) -> Result<Vec<u32>, CnpjFormatError> {
    let cleaned = normalize_cnpj(value);
    if cleaned.len() != expected {
        return Err(CnpjFormatError {
            value: value.into(),
            reason: format!("expected {expected} digits, got {}", cleaned.len()),
        });
    }
    let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();
    // Repeated digits pass the checksum but are never issued.
    if digits.iter().all(|d| *d == digits[0]) {
        return Err(CnpjFormatError {
            value: value.into(),
            reason: "all digits are equal".into(),
        });
    }
    Ok(digits)
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

fn to_string(digits: &[u32]) -> String {
    digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_cnpj_bare() {
        assert_eq!(validate_cnpj("11222333000181").unwrap(), "11222333000181");
        assert!(validate_cnpj("12345678000195").is_ok());
    }

    #[test]
    fn valid_cnpj_punctuated() {
        assert_eq!(
            validate_cnpj("11.222.333/0001-81").unwrap(),
            "11222333000181"
        );
    }

    #[test]
    fn cnpj_with_zero_check_digit() {
        assert!(validate_cnpj("99988877000108").is_ok());
    }

    #[test]
    fn cnpj_wrong_check_digit() {
        let err = validate_cnpj("11222333000182").unwrap_err();
        assert_eq!(err.reason, "check digits do not match");
    }

    #[test]
    fn cnpj_wrong_length() {
        assert!(validate_cnpj("1122233300018").is_err());
        assert!(validate_cnpj("").is_err());
    }

    #[test]
    fn cnpj_repeated_digits_rejected() {
        assert!(validate_cnpj("00000000000000").is_err());
        assert!(validate_cnpj("11111111111111").is_err());
    }

    #[test]
    fn valid_cpf() {
        assert_eq!(validate_cpf("529.982.247-25").unwrap(), "52998224725");
        assert!(validate_cpf("11144477735").is_ok());
    }

    #[test]
    fn invalid_cpf() {
        assert!(validate_cpf("52998224724").is_err());
        assert!(validate_cpf("11111111111").is_err());
    }

    #[test]
    fn format_roundtrip() {
        assert_eq!(
            format_cnpj("11222333000181").as_deref(),
            Some("11.222.333/0001-81")
        );
        assert!(format_cnpj("123").is_none());
    }
}
