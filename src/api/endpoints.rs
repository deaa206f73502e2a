use reqwest::StatusCode;

/// Vendor endpoints the crate talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SendCode,
    TokenSms,
    Refresh,
    ListCars,
    ListCommands,
    SendCommand,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Self::SendCode => "send-code",
            Self::TokenSms => "token-sms",
            Self::Refresh => "refresh",
            Self::ListCars => "list-cars",
            Self::ListCommands => "list-commands",
            Self::SendCommand => "send-command",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Status codes meaning "the access token was not accepted", per endpoint.
///
/// The device command endpoints answer an expired token with 500 instead
/// of 401. That is a quirk of the vendor API, not a general rule: a 500
/// anywhere else is an ordinary failure.
const CREDENTIAL_REJECTED: &[(Endpoint, StatusCode)] = &[
    (Endpoint::ListCars, StatusCode::UNAUTHORIZED),
    (Endpoint::ListCommands, StatusCode::INTERNAL_SERVER_ERROR),
    (Endpoint::SendCommand, StatusCode::INTERNAL_SERVER_ERROR),
];

pub fn rejects_credential(endpoint: Endpoint, status: StatusCode) -> bool {
    CREDENTIAL_REJECTED
        .iter()
        .any(|(e, s)| *e == endpoint && *s == status)
}
