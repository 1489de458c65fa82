//! Session context provider

use crate::session::{SessionError, SessionState, SessionStore};
use goftr_admin_core::UserProfile;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Counter bumped whenever the session changes, so consumers re-render
#[derive(Debug, Default, Clone, PartialEq)]
struct Revision(u64);

impl Reducible for Revision {
    type Action = ();

    fn reduce(self: Rc<Self>, _action: Self::Action) -> Rc<Self> {
        Rc::new(Self(self.0.wrapping_add(1)))
    }
}

/// What components see through [`use_session`]
#[derive(Clone, PartialEq)]
pub struct SessionContext {
    pub store: SessionStore,
    pub revision: u64,
    dispatcher: UseReducerDispatcher<Revision>,
}

impl SessionContext {
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// Re-render consumers after changing the store directly
    pub fn notify(&self) {
        self.dispatcher.dispatch(());
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, SessionError> {
        let result = self.store.sign_in(email, password).await;
        self.notify();
        result
    }

    pub async fn sign_out(&self) {
        self.store.sign_out().await;
        self.notify();
    }

    pub fn logout(&self) {
        self.store.logout();
        self.notify();
    }
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub session: SessionStore,
    pub children: Children,
}

/// Provides the session to the tree and loads the profile on mount
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let revision = use_reducer(Revision::default);

    {
        let dispatcher = revision.dispatcher();
        use_effect_with(props.session.clone(), move |session| {
            let session = session.clone();
            spawn_local(async move {
                // Failures are logged by the store; the cached profile stays.
                if session.get_profile().await.is_ok() {
                    dispatcher.dispatch(());
                }
            });
            || ()
        });
    }

    let context = SessionContext {
        store: props.session.clone(),
        revision: revision.0,
        dispatcher: revision.dispatcher(),
    };

    html! {
        <ContextProvider<SessionContext> context={context}>
            {props.children.clone()}
        </ContextProvider<SessionContext>>
    }
}

/// Hook to use the session context
#[hook]
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>()
        .expect("SessionContext not found. Make sure to wrap your component with SessionProvider")
}
