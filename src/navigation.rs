use std::fmt;
use std::str::FromStr;

/// Top-level screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    Auth,
    #[default]
    Dashboard,
    AddItem,
    Marketplace,
    RepairNetwork,
    Donations,
    Challenges,
    History,
    Analytics,
    About,
    Settings,
}

impl View {
    pub const ALL: [View; 11] = [
        View::Auth,
        View::Dashboard,
        View::AddItem,
        View::Marketplace,
        View::RepairNetwork,
        View::Donations,
        View::Challenges,
        View::History,
        View::Analytics,
        View::About,
        View::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Auth => "auth",
            View::Dashboard => "dashboard",
            View::AddItem => "add-item",
            View::Marketplace => "marketplace",
            View::RepairNetwork => "repair-network",
            View::Donations => "donations",
            View::Challenges => "challenges",
            View::History => "history",
            View::Analytics => "analytics",
            View::About => "about",
            View::Settings => "settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown view '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LoggedIn,
    LoggedOut,
    Navigate(View),
}

/// Client routing state. Logged-out clients always see the auth screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    LoggedOut,
    LoggedIn { view: View },
}

impl AppState {
    pub fn view(&self) -> View {
        match self {
            AppState::LoggedOut => View::Auth,
            AppState::LoggedIn { view } => *view,
        }
    }

    pub fn transition(self, event: Event) -> AppState {
        match (self, event) {
            (_, Event::LoggedOut) => AppState::LoggedOut,
            (AppState::LoggedOut, Event::LoggedIn) => AppState::LoggedIn {
                view: View::Dashboard,
            },
            (state @ AppState::LoggedIn { .. }, Event::LoggedIn) => state,
            (AppState::LoggedOut, Event::Navigate(_)) => AppState::LoggedOut,
            // The auth screen is only reachable by logging out
            (state @ AppState::LoggedIn { .. }, Event::Navigate(View::Auth)) => state,
            (AppState::LoggedIn { .. }, Event::Navigate(view)) => AppState::LoggedIn { view },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_ignores_navigation() {
        let state = AppState::default().transition(Event::Navigate(View::History));
        assert_eq!(state, AppState::LoggedOut);
        assert_eq!(state.view(), View::Auth);
    }

    #[test]
    fn test_login_lands_on_dashboard_then_navigates() {
        let state = AppState::default()
            .transition(Event::LoggedIn)
            .transition(Event::Navigate(View::Analytics));
        assert_eq!(state.view(), View::Analytics);

        let state = state.transition(Event::Navigate(View::Auth));
        assert_eq!(state.view(), View::Analytics);

        let state = state.transition(Event::LoggedOut);
        assert_eq!(state.view(), View::Auth);
    }

    #[test]
    fn test_view_names_round_trip() {
        for view in View::ALL {
            assert_eq!(view.as_str().parse::<View>().unwrap(), view);
        }
        assert_eq!("add-item".parse::<View>().unwrap(), View::AddItem);
        assert!("nowhere".parse::<View>().is_err());
    }
}
