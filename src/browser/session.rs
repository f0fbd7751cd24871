use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::dom::document::{Document, DomMutation};
use crate::dom::selector_map::SelectorMap;
use crate::error::{AutofillError, Result};
use crate::page::Page;
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Filling a form can wait on the mapping call for a while
        launch_opts.idle_browser_timeout = Duration::from_secs(10 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| AutofillError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| AutofillError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| AutofillError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| AutofillError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// The visible tab, or the most recently opened one
    pub fn tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        for tab in &tabs {
            match tab.evaluate("document.visibilityState === 'visible'", false) {
                Ok(remote_object) => {
                    if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                        return Ok(tab.clone());
                    }
                }
                Err(e) => {
                    log::debug!("Failed to check tab status: {}", e);
                }
            }
        }

        tabs.last()
            .cloned()
            .ok_or_else(|| AutofillError::TabOperationFailed("No tab is open".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the active tab and wait for the load to finish
    pub fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| AutofillError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| AutofillError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Snapshot the active tab's current DOM as a [`Page`]
    pub fn capture_page(&self) -> Result<Page> {
        let tab = self.tab()?;
        let html = tab
            .get_content()
            .map_err(|e| AutofillError::EvaluationFailed(format!("Failed to read page content: {}", e)))?;
        let url = tab.get_url();
        log::debug!("Captured {} bytes of markup from {}", html.len(), url);

        Ok(Page::from_html(url, &html))
    }

    /// Replay mutations recorded on a captured document into the live tab.
    ///
    /// Each target is addressed by a selector derived from `document`, so the
    /// tab must not have re-rendered since the capture. Returns how many
    /// mutations found their element.
    pub fn apply_mutations(&self, document: &Document, mutations: &[DomMutation]) -> Result<usize> {
        let tab = self
            .tab()
            .map_err(|e| AutofillError::InjectionInfrastructure(e.to_string()))?;
        let selectors = SelectorMap::for_nodes(document, mutations.iter().map(DomMutation::target));

        let mut applied = 0;
        for mutation in mutations {
            let Some(selector) = selectors.get(mutation.target()) else {
                continue;
            };
            let script = mutation_script(&selector.candidates(), mutation)?;
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| AutofillError::EvaluationFailed(e.to_string()))?;

            if result.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                applied += 1;
            } else {
                log::warn!("Element '{}' is gone from the live page", selector.best_selector());
            }
        }

        log::info!("Applied {}/{} mutations to the live page", applied, mutations.len());
        Ok(applied)
    }
}

/// JavaScript that performs one mutation on the element matched by the first
/// selector that matches anything, and evaluates to whether one did
pub fn mutation_script(selectors: &[String], mutation: &DomMutation) -> Result<String> {
    let action = match mutation {
        DomMutation::SetValue { value, .. } | DomMutation::SelectValue { value, .. } => {
            format!("el.value = {}; notify();", js_string(value)?)
        }
        DomMutation::SetChecked { checked, .. } => format!("el.checked = {}; notify();", checked),
        DomMutation::Click { .. } => "el.click();".to_string(),
    };

    Ok(format!(
        r#"(function() {{
    const el = {selectors}.map(selector => {{
        try {{ return document.querySelector(selector); }} catch (e) {{ return null; }}
    }}).find(Boolean);
    if (!el) return false;
    const notify = () => ['input', 'change', 'blur'].forEach(type =>
        el.dispatchEvent(new Event(type, {{ bubbles: true, cancelable: true }})));
    {action}
    return true;
}})()"#,
        selectors = serde_json::to_string(selectors).map_err(|e| AutofillError::EvaluationFailed(e.to_string()))?,
    ))
}

/// Quoted JSON string, usable verbatim as a JavaScript literal
fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AutofillError::EvaluationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::NodeId;

    fn target() -> NodeId {
        Document::parse("<input id=\"a\">").get_element_by_id("a").unwrap()
    }

    #[test]
    fn test_value_script_escapes_input() {
        let mutation = DomMutation::SetValue {
            target: target(),
            value: "O'Brien \"Jr\"</script>".to_string(),
        };
        let script = mutation_script(&["input[name='last']".to_string()], &mutation).unwrap();

        assert!(script.contains(r#"["input[name='last']"].map("#));
        assert!(script.contains(r#"el.value = "O'Brien \"Jr\"</script>"; notify();"#));
    }

    #[test]
    fn test_checked_and_click_scripts() {
        let checked = mutation_script(&["#agree".to_string()], &DomMutation::SetChecked { target: target(), checked: true }).unwrap();
        assert!(checked.contains("el.checked = true; notify();"));

        let click = mutation_script(&["#go".to_string()], &DomMutation::Click { target: target() }).unwrap();
        assert!(click.contains("el.click();"));
        assert!(!click.contains("; notify();"));
    }

    #[test]
    fn test_script_falls_back_through_selectors() {
        let document = Document::parse("<div><input id=\"2fa\" name=\"code\"></div>");
        let node = document.get_element_by_id("2fa").unwrap();
        let selectors = SelectorMap::for_nodes(&document, [node]);
        let mutation = DomMutation::SetValue {
            target: node,
            value: "123456".to_string(),
        };

        let script = mutation_script(&selectors.get(node).unwrap().candidates(), &mutation).unwrap();
        assert!(script.contains(r#""input[id=\"2fa\"]","input[name=\"code\"]"]"#));
        assert!(script.contains("catch (e) { return null; }"));
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_launch_and_capture() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session
            .navigate("data:text/html,<html><body><input id='q'></body></html>")
            .expect("Failed to navigate");

        let page = session.capture_page().expect("Failed to capture page");
        assert!(page.document().get_element_by_id("q").is_some());
    }
}
