use ::url::Url;

/// Canonicalizes an href against the site origin
///
/// # Normalization Steps
///
/// 1. Strip a single leading `#` (anchor-style hrefs such as `#/Some-Article`)
/// 2. Resolve the remainder against `base` (standard relative resolution)
/// 3. Keep only the resolved path and graft it onto the base origin
/// 4. Drop query string and fragment
///
/// Because only the path survives, two hrefs that differ only in query or
/// fragment collapse to the same canonical URL, and every result lives on
/// the base origin.
///
/// Never fails: input that cannot be resolved falls back to the base URL
/// with whatever path could be salvaged.
///
/// # Arguments
///
/// * `href` - The raw href as found in page markup
/// * `base` - The fixed site origin
///
/// # Examples
///
/// ```
/// use pixel_harvest::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://www.wikihow.com/").unwrap();
/// assert_eq!(
///     normalize("/Tie-a-Tie?amp=1#step-2", &base),
///     "https://www.wikihow.com/Tie-a-Tie"
/// );
/// ```
pub fn normalize(href: &str, base: &Url) -> String {
    let href = href.trim();
    let href = href.strip_prefix('#').unwrap_or(href);

    let mut canonical = base.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);

    match base.join(href) {
        Ok(resolved) if !resolved.cannot_be_a_base() => {
            canonical.set_path(resolved.path());
        }
        Ok(resolved) => {
            // mailto:, data: and friends carry an opaque path; keep it as a relative segment
            canonical.set_path(&format!("/{}", resolved.path().trim_start_matches('/')));
        }
        Err(e) => {
            tracing::trace!("Falling back to raw path for {:?}: {}", href, e);
            canonical.set_path(&format!("/{}", strip_query_and_fragment(href)));
        }
    }

    canonical.to_string()
}

/// Returns the portion of an href before any `?` or `#`
fn strip_query_and_fragment(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    href[..end].trim_start_matches('/')
}
