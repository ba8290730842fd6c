//! Target builders for the built-in sources
//!
//! Each source is a recipe for turning portal configuration into the
//! concrete list of [`FetchTarget`]s a run visits. Custom targets come
//! straight from the command line and bypass these builders.

use crate::config::PortalConfig;
use crate::error::{Result, ScoutError};
use crate::scrape::target::FetchTarget;

/// Announcements live in the D2L news tool for the configured course.
pub fn announcements(portal: &PortalConfig, course_override: Option<&str>) -> Vec<FetchTarget> {
    let course = course_override.unwrap_or(&portal.course_id);
    let base = portal.lms_base_url.trim_end_matches('/');
    vec![FetchTarget::new(
        format!("Course {} announcements", course),
        format!("{}/d2l/lms/news/main.d2l?ou={}", base, course),
    )]
}

/// One target per configured faculty profile page.
pub fn professors(portal: &PortalConfig) -> Result<Vec<FetchTarget>> {
    if portal.faculty_pages.is_empty() {
        return Err(ScoutError::Config(
            "no faculty pages configured; add portal.faculty_pages entries".to_string(),
        )
        .into());
    }
    Ok(portal
        .faculty_pages
        .iter()
        .map(|page| FetchTarget::new(page.label.clone(), page.url.clone()))
        .collect())
}

/// Campus events come from a SharePoint events list on the configured
/// site.
pub fn events(portal: &PortalConfig) -> Result<Vec<FetchTarget>> {
    if portal.sharepoint_site_url.is_empty() {
        return Err(ScoutError::Config(
            "portal.sharepoint_site_url is required for the events source".to_string(),
        )
        .into());
    }
    let site = portal.sharepoint_site_url.trim_end_matches('/');
    let url = if portal.sharepoint_events_list_id.is_empty() {
        format!("{}/_layouts/15/Events.aspx", site)
    } else {
        format!(
            "{}/_layouts/15/Events.aspx?ListGuid={}",
            site, portal.sharepoint_events_list_id
        )
    };
    Ok(vec![FetchTarget::new("Campus events", url)])
}
