//! Route guard component for the panel's pages

use super::use_session;
use crate::guard::{GuardDecision, NavigationTarget};
use tracing::debug;
use yew::prelude::*;
use yew_router::hooks::use_location;

#[derive(Properties, PartialEq)]
pub struct RequireAccessProps {
    pub children: Children,
    /// Rendered while a redirect is pending
    #[prop_or_default]
    pub fallback: Html,
}

/// Renders its children only when the route guard allows the current
/// location, otherwise redirects to where the guard points
#[function_component(RequireAccess)]
pub fn require_access(props: &RequireAccessProps) -> Html {
    let session = use_session();
    let location = use_location();

    let decision = location.map(|location| {
        let target = NavigationTarget::new(location.path(), Some(location.query_str()));
        session.store.guard().evaluate(&target, &session.state())
    });

    {
        let navigator = session.store.navigator().clone();
        use_effect_with(decision.clone(), move |decision| {
            if let Some(GuardDecision::Redirect { location, reason }) = decision {
                debug!(?reason, %location, "Route guard redirect");
                navigator.redirect(location);
            }
            || ()
        });
    }

    match decision {
        Some(GuardDecision::Allow) => html! { <>{ props.children.clone() }</> },
        _ => props.fallback.clone(),
    }
}
