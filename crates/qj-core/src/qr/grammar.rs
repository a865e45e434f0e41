//! Link grammar of scanned codes.
//!
//! Turns raw text into a [`ScannedCode`] without touching any store. More
//! specific shapes are tried first; generic URLs and text are the fallback.

use std::collections::HashMap;

use super::addr::{may_be_valid_addr, normalize_addr, normalize_name};
use super::invite::OPENPGP4FPR_SCHEME;
use super::{Fingerprint, GroupInvite, QrParseError};

const INVITE_LINK_PREFIX: &str = "https://i.delta.chat/#";
const ACCOUNT_SCHEME: &str = "DCACCOUNT:";
const MAILTO_SCHEME: &str = "mailto:";
const SMTP_SCHEME: &str = "SMTP:";
const MATMSG_SCHEME: &str = "MATMSG:";
const VCARD_BEGIN: &str = "BEGIN:VCARD";

/// Parameters of an `OPENPGP4FPR:` code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintCode {
    pub fingerprint: Fingerprint,
    pub addr: Option<String>,
    pub name: Option<String>,
    pub invitenumber: Option<String>,
    pub auth: Option<String>,
    pub group: Option<GroupInvite>,
}

impl FingerprintCode {
    /// Address, invitenumber and auth are all needed to run the handshake.
    pub fn has_invite_tokens(&self) -> bool {
        self.addr.is_some() && self.invitenumber.is_some() && self.auth.is_some()
    }
}

/// Structural shape of a scanned code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedCode {
    Fingerprint(FingerprintCode),
    Address { addr: String, name: Option<String> },
    Account { url: String, domain: String },
    Url(String),
    Text(String),
}

/// Parses `raw` into its most specific shape.
pub fn parse(raw: &str) -> Result<ScannedCode, QrParseError> {
    let qr = raw.trim();
    if qr.is_empty() {
        return Err(QrParseError::Empty);
    }

    if let Some(rest) = strip_prefix_ignore_case(qr, OPENPGP4FPR_SCHEME) {
        return parse_fingerprint_code(rest, '#');
    }
    if let Some(rest) = strip_prefix_ignore_case(qr, INVITE_LINK_PREFIX) {
        return parse_fingerprint_code(rest, '&');
    }
    if let Some(rest) = strip_prefix_ignore_case(qr, ACCOUNT_SCHEME) {
        return parse_account(rest);
    }
    if let Some(rest) = strip_prefix_ignore_case(qr, MAILTO_SCHEME) {
        // mailto:addr?subject=...&body=...
        let addr = rest.split('?').next().unwrap_or_default();
        return address(addr, None);
    }
    if let Some(rest) = strip_prefix_ignore_case(qr, SMTP_SCHEME) {
        // SMTP:addr:subject:body
        let addr = rest.split(':').next().unwrap_or_default();
        return address(addr, None);
    }
    if strip_prefix_ignore_case(qr, MATMSG_SCHEME).is_some() {
        // MATMSG:TO:addr;SUB:subject;BODY:body;
        let to = qr.find("TO:").ok_or(QrParseError::BadAddress)?;
        let addr = qr[to + 3..].split(';').next().unwrap_or_default();
        return address(addr, None);
    }
    if strip_prefix_ignore_case(qr, VCARD_BEGIN).is_some() {
        return parse_vcard(qr);
    }
    if strip_prefix_ignore_case(qr, "http://").is_some()
        || strip_prefix_ignore_case(qr, "https://").is_some()
    {
        return Ok(ScannedCode::Url(qr.to_string()));
    }

    Ok(ScannedCode::Text(qr.to_string()))
}

fn parse_fingerprint_code(rest: &str, separator: char) -> Result<ScannedCode, QrParseError> {
    let (fingerprint_part, fragment) = match rest.split_once(separator) {
        Some((fpr, fragment)) => (fpr, Some(fragment)),
        None => (rest, None),
    };

    let mut code = FingerprintCode {
        fingerprint: Fingerprint::parse(fingerprint_part)?,
        addr: None,
        name: None,
        invitenumber: None,
        auth: None,
        group: None,
    };

    let params = match fragment {
        Some(fragment) => parse_params(fragment),
        None => return Ok(ScannedCode::Fingerprint(code)),
    };

    // Without an address the remaining parameters are meaningless.
    let Some(addr) = params.get(&'a') else {
        return Ok(ScannedCode::Fingerprint(code));
    };
    code.addr = Some(checked_addr(addr)?);
    code.name = decoded(&params, 'n')?
        .map(|name| normalize_name(&name))
        .filter(|name| !name.is_empty());
    code.invitenumber = params.get(&'i').cloned().filter(|v| !v.is_empty());
    code.auth = params.get(&'s').cloned().filter(|v| !v.is_empty());

    if let (Some(id), Some(name)) = (decoded(&params, 'x')?, decoded(&params, 'g')?) {
        if !id.is_empty() && !name.is_empty() {
            code.group = Some(GroupInvite { id, name });
        }
    }

    Ok(ScannedCode::Fingerprint(code))
}

fn parse_account(rest: &str) -> Result<ScannedCode, QrParseError> {
    let url = rest.trim();
    let after_scheme = strip_prefix_ignore_case(url, "https://")
        .or_else(|| strip_prefix_ignore_case(url, "http://"))
        .ok_or_else(|| QrParseError::BadAccountLink("missing http(s) URL".to_string()))?;

    let host = after_scheme
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let domain = host.rsplit('@').next().unwrap_or_default();
    let domain = domain.split(':').next().unwrap_or_default();
    if domain.is_empty() {
        return Err(QrParseError::BadAccountLink("missing host".to_string()));
    }

    Ok(ScannedCode::Account {
        url: url.to_string(),
        domain: domain.to_ascii_lowercase(),
    })
}

fn parse_vcard(qr: &str) -> Result<ScannedCode, QrParseError> {
    let mut addr: Option<&str> = None;
    let mut name: Option<String> = None;

    for line in qr.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        // `EMAIL;type=work:` carries parameters after the key
        let key = key.split(';').next().unwrap_or_default();
        if key.eq_ignore_ascii_case("EMAIL") && addr.is_none() {
            addr = value.split(';').next();
        } else if key.eq_ignore_ascii_case("N") {
            // lastname;firstname;additional;prefix - keep the first two
            let mut parts = value.splitn(3, ';');
            let last = parts.next().unwrap_or_default();
            let first = parts.next().unwrap_or_default();
            name = Some(normalize_name(&format!("{last},{first}")));
        }
    }

    match addr {
        Some(addr) => address(addr, name.filter(|n| !n.is_empty())),
        None => Err(QrParseError::BadAddress),
    }
}

fn address(raw: &str, name: Option<String>) -> Result<ScannedCode, QrParseError> {
    Ok(ScannedCode::Address {
        addr: checked_addr(raw)?,
        name,
    })
}

fn checked_addr(raw: &str) -> Result<String, QrParseError> {
    let decoded = url_decode(raw).map_err(|_| QrParseError::BadAddress)?;
    let addr = normalize_addr(&decoded);
    if !may_be_valid_addr(&addr) {
        return Err(QrParseError::BadAddress);
    }
    Ok(addr)
}

/// Splits `k=v&k=v`; only the first character of each key counts.
fn parse_params(fragment: &str) -> HashMap<char, String> {
    fragment
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.chars().next()?;
            Some((key, value.to_string()))
        })
        .collect()
}

fn decoded(params: &HashMap<char, String>, key: char) -> Result<Option<String>, QrParseError> {
    params
        .get(&key)
        .map(|value| url_decode(value).map_err(|_| QrParseError::BadEncoding(key)))
        .transpose()
}

fn url_decode(value: &str) -> Result<String, std::string::FromUtf8Error> {
    urlencoding::decode(&value.replace('+', " ")).map(|v| v.into_owned())
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPR: &str = "1234567890ABCDEF1234567890ABCDEF12345678";

    fn fingerprint_code(raw: &str) -> FingerprintCode {
        match parse(raw) {
            Ok(ScannedCode::Fingerprint(code)) => code,
            other => panic!("expected fingerprint code, got {other:?}"),
        }
    }

    #[test]
    fn parses_contact_invitation() {
        let code = fingerprint_code(&format!(
            "OPENPGP4FPR:{FPR}#a=alice%40example.com&n=Alice&i=INV123&s=AUTH456"
        ));
        assert_eq!(code.addr.as_deref(), Some("alice@example.com"));
        assert_eq!(code.name.as_deref(), Some("Alice"));
        assert_eq!(code.invitenumber.as_deref(), Some("INV123"));
        assert_eq!(code.auth.as_deref(), Some("AUTH456"));
        assert!(code.group.is_none());
        assert!(code.has_invite_tokens());
    }

    #[test]
    fn parses_group_invitation_with_encoded_name() {
        let code = fingerprint_code(&format!(
            "openpgp4fpr:{FPR}#a=alice@example.com&g=Book%20Club&x=grp-1&i=INV&s=AUTH"
        ));
        assert_eq!(
            code.group,
            Some(GroupInvite {
                id: "grp-1".to_string(),
                name: "Book Club".to_string()
            })
        );
    }

    #[test]
    fn invite_link_form_wins_over_generic_url() {
        let code = fingerprint_code(&format!(
            "https://i.delta.chat/#{FPR}&a=alice%40example.com&n=Alice&i=INV&s=AUTH"
        ));
        assert_eq!(code.addr.as_deref(), Some("alice@example.com"));
        assert!(code.has_invite_tokens());
    }

    #[test]
    fn fingerprint_only_code_has_no_address() {
        let code = fingerprint_code(&format!("OPENPGP4FPR:{FPR}"));
        assert!(code.addr.is_none());
        assert!(!code.has_invite_tokens());
    }

    #[test]
    fn truncated_invitation_is_rejected() {
        assert_eq!(
            parse("OPENPGP4FPR:1234567890AB"),
            Err(QrParseError::BadFingerprintLength)
        );
        assert_eq!(
            parse("OPENPGP4FPR:"),
            Err(QrParseError::BadFingerprintLength)
        );
    }

    #[test]
    fn bad_address_in_invitation_is_rejected() {
        assert_eq!(
            parse(&format!("OPENPGP4FPR:{FPR}#a=not-an-address&i=I&s=S")),
            Err(QrParseError::BadAddress)
        );
    }

    #[test]
    fn mail_schemes_yield_addresses() {
        let expected = ScannedCode::Address {
            addr: "bob@example.org".to_string(),
            name: None,
        };
        assert_eq!(parse("mailto:bob@example.org?subject=hi").unwrap(), expected);
        assert_eq!(parse("SMTP:bob@example.org:subject:body").unwrap(), expected);
        assert_eq!(
            parse("MATMSG:TO:bob@example.org;SUB:hi;BODY:there;;").unwrap(),
            expected
        );
        assert_eq!(parse("MATMSG:SUB:no recipient;;"), Err(QrParseError::BadAddress));
    }

    #[test]
    fn vcard_takes_first_email_and_name() {
        let vcard = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane;;;\nEMAIL;type=work:jane@example.org\nEMAIL:other@example.org\nEND:VCARD";
        assert_eq!(
            parse(vcard).unwrap(),
            ScannedCode::Address {
                addr: "jane@example.org".to_string(),
                name: Some("Jane Doe".to_string()),
            }
        );
    }

    #[test]
    fn account_link_extracts_domain() {
        assert_eq!(
            parse("DCACCOUNT:https://Chat.Example.org/new_email?t=abc&v=1").unwrap(),
            ScannedCode::Account {
                url: "https://Chat.Example.org/new_email?t=abc&v=1".to_string(),
                domain: "chat.example.org".to_string(),
            }
        );
        assert!(matches!(
            parse("DCACCOUNT:ftp://example.org"),
            Err(QrParseError::BadAccountLink(_))
        ));
    }

    #[test]
    fn generic_url_and_text_are_fallbacks() {
        assert_eq!(
            parse("https://example.com/page").unwrap(),
            ScannedCode::Url("https://example.com/page".to_string())
        );
        assert_eq!(
            parse("hello world").unwrap(),
            ScannedCode::Text("hello world".to_string())
        );
    }

    #[test]
    fn empty_and_whitespace_input_is_rejected() {
        assert_eq!(parse(""), Err(QrParseError::Empty));
        assert_eq!(parse(" \n\t "), Err(QrParseError::Empty));
    }
}
