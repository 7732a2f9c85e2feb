use crate::error::{ AppError, Result };

fn strip_scheme(url: &str) -> Option<&str> {
    url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))
}

fn invalid(raw: &str) -> AppError {
    AppError::InvalidInput(format!("'{}' is not a product page URL", raw))
}

/// Canonicalise a product page URL against the shop base URL.
///
/// Accepts `https://host/product/<slug>/anything?query`, the `http` form and
/// the scheme-less `host/product/<slug>` form; returns
/// `<base>/product/<slug>`. Any other host or path is rejected.
pub fn normalize_product_url(base: &str, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let host = strip_scheme(base).unwrap_or(base).trim_end_matches('/');

    let rest = match strip_scheme(raw) {
        Some(rest) => rest,
        None if raw.contains("://") => {
            return Err(invalid(raw));
        }
        None => raw,
    };

    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let mut parts = rest.split('/');

    let url_host = parts.next().unwrap_or_default();
    if !url_host.eq_ignore_ascii_case(host) {
        return Err(invalid(raw));
    }
    if parts.next() != Some("product") {
        return Err(invalid(raw));
    }
    let slug = parts.next().unwrap_or_default();
    if slug.is_empty() {
        return Err(invalid(raw));
    }

    Ok(format!("{}/product/{}", base.trim_end_matches('/'), slug))
}

/// Product page URL for a bare SKU.
pub fn sku_url(base: &str, sku: &str) -> Result<String> {
    let sku = sku.trim();
    if sku.is_empty() || !sku.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(AppError::InvalidInput(format!("'{}' is not a valid SKU", sku)));
    }
    Ok(format!("{}/product/{}", base.trim_end_matches('/'), sku))
}

/// Trailing number of a product slug, e.g. `blender-x200-123456` -> `123456`.
pub fn sku_from_url(url: &str) -> Option<String> {
    let slug = url.trim_end_matches('/').rsplit('/').next()?;
    let sku = slug.rsplit('-').next()?;
    if !sku.is_empty() && sku.chars().all(|c| c.is_ascii_digit()) {
        Some(sku.to_string())
    } else {
        None
    }
}
