/// Authentication module
///
/// Token claims, the two-domain credential codec and the helpers used to
/// fingerprint refresh tokens before they are stored.

mod claims;
mod codec;
mod refresh_token;

pub use claims::{AccessClaims, RefreshClaims, TokenKind, ACCESS_TOKEN_TYPE, REFRESH_TOKEN_TYPE};
pub use codec::{CodecError, TokenCodec};
pub use refresh_token::{generate_token_id, token_fingerprint};
