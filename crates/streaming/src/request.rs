use foundation::bounds::ImageRect;

/// Identifies one in-flight fetch in a deterministic, stable way.
///
/// Tokens are monotonically increasing; a completion carrying anything but
/// the most recently issued token is stale and must be discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Issues tokens and tracks the single current one.
///
/// Cancellation is by staleness, not true abort: superseded requests keep
/// running, their results just never apply.
#[derive(Debug, Default)]
pub struct TokenIssuer {
    next: u64,
    current: Option<RequestToken>,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.current = Some(token);
        token
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == Some(token)
    }

    /// Invalidate every outstanding token (data-source switch).
    pub fn invalidate_all(&mut self) {
        self.current = None;
    }
}

/// Identity of a viewport-scoped fetch: source + quantized bounds + zoom.
///
/// Identical keys must not double-fetch while a request for that key is
/// already in flight; rapid oscillation around the mode threshold makes
/// repeated identical settles expected input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    source: String,
    x_min: i64,
    x_max: i64,
    y_min: i64,
    y_max: i64,
    zoom_milli: i64,
}

impl FetchKey {
    pub fn new(source: &str, bounds: &ImageRect, zoom: f64) -> Self {
        Self {
            source: source.to_string(),
            x_min: bounds.x_min.round() as i64,
            x_max: bounds.x_max.round() as i64,
            y_min: bounds.y_min.round() as i64,
            y_max: bounds.y_max.round() as i64,
            zoom_milli: (zoom * 1000.0).round() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchKey, TokenIssuer};
    use foundation::bounds::ImageRect;

    #[test]
    fn only_the_latest_token_is_current() {
        let mut issuer = TokenIssuer::new();
        let r1 = issuer.issue();
        let r2 = issuer.issue();
        assert!(!issuer.is_current(r1));
        assert!(issuer.is_current(r2));
    }

    #[test]
    fn invalidate_all_leaves_no_current_token() {
        let mut issuer = TokenIssuer::new();
        let r = issuer.issue();
        issuer.invalidate_all();
        assert!(!issuer.is_current(r));
    }

    #[test]
    fn keys_for_identical_viewports_match() {
        let a = ImageRect::new(0.0001, 100.0, 0.0, 50.0);
        let b = ImageRect::new(0.0, 99.9999, 0.0002, 50.0);
        assert_eq!(
            FetchKey::new("a.geojson", &a, 3.0),
            FetchKey::new("a.geojson", &b, 3.0)
        );
    }

    #[test]
    fn keys_differ_across_zoom_and_source() {
        let r = ImageRect::new(0.0, 100.0, 0.0, 50.0);
        assert_ne!(
            FetchKey::new("a.geojson", &r, 3.0),
            FetchKey::new("a.geojson", &r, 9.0)
        );
        assert_ne!(
            FetchKey::new("a.geojson", &r, 3.0),
            FetchKey::new("b.geojson", &r, 3.0)
        );
    }
}
