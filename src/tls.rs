//! Process-wide TLS setup.
//!
//! rustls 0.23 needs a crypto provider before the first handshake, and
//! both the WebSocket client and the market-name HTTP client share it.

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Installs the `ring` provider as the process default.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        // Fails only if another provider was installed first, which is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
