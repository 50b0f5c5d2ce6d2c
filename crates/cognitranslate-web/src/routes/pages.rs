//! Page routes - full HTML page renders.

use crate::templates::IndexTemplate;

/// The translator page.
pub async fn index() -> IndexTemplate {
    IndexTemplate::default()
}
