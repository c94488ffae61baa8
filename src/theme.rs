pub const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Value for the document's `data-theme` attribute.
    pub fn as_attr(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon for the toggle: shows the theme a click switches to.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }

    pub fn from_cookie_header(header: &str) -> Option<Self> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            if name.trim() == THEME_COOKIE {
                Theme::parse(value)
            } else {
                None
            }
        })
    }

    /// Resolves the initial theme: explicit cookie, then the browser's
    /// `Sec-CH-Prefers-Color-Scheme` hint, then light.
    pub fn resolve(cookie_header: Option<&str>, color_scheme_hint: Option<&str>) -> Self {
        cookie_header
            .and_then(Theme::from_cookie_header)
            .or_else(|| color_scheme_hint.and_then(Theme::parse))
            .unwrap_or_default()
    }

    pub fn set_cookie_value(self) -> String {
        format!(
            "{}={}; Path=/; Max-Age=31536000; SameSite=Lax",
            THEME_COOKIE,
            self.as_attr()
        )
    }
}
