use leptos::*;
use leptos_router::use_navigate;

use super::{
    feed::{submit_new_story, AppContext},
    hack_or_snooze::NewStory,
    server::ServerApi,
    session::{BrowserCredentials, SessionManager},
};

#[component]
pub fn LoginForm() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let credentials = expect_context::<BrowserCredentials>();
    let navigate = use_navigate();

    let username = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();

        let credentials = credentials.clone();
        let navigate = navigate.clone();
        let (name, pass) = (username.get_untracked(), password.get_untracked());

        spawn_local(async move {
            match SessionManager::new(&ServerApi, &credentials)
                .login(&name, &pass)
                .await
            {
                Ok(session) => {
                    username.set(String::new());
                    password.set(String::new());
                    ctx.start_session(session);
                    navigate("/", Default::default());
                }
                Err(err) => ctx.report(&err),
            }
        });
    };

    view! {
        <form id="login-form" class="account-form" on:submit=on_submit>
            <h4>"Login"</h4>
            <div class="login-input">
                <label for="login-username">"username"</label>
                <input
                    id="login-username"
                    autocomplete="current-username"
                    prop:value=move || username.get()
                    on:input=move |ev| username.set(event_target_value(&ev))
                />
            </div>
            <div class="login-input">
                <label for="login-password">"password"</label>
                <input
                    id="login-password"
                    type="password"
                    autocomplete="current-password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
            </div>
            <button type="submit">"login"</button>
        </form>
    }
}

#[component]
pub fn SignupForm() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let credentials = expect_context::<BrowserCredentials>();
    let navigate = use_navigate();

    let name = create_rw_signal(String::new());
    let username = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();

        let credentials = credentials.clone();
        let navigate = navigate.clone();
        let (full_name, user, pass) = (
            name.get_untracked(),
            username.get_untracked(),
            password.get_untracked(),
        );

        spawn_local(async move {
            match SessionManager::new(&ServerApi, &credentials)
                .signup(&user, &pass, &full_name)
                .await
            {
                Ok(session) => {
                    name.set(String::new());
                    username.set(String::new());
                    password.set(String::new());
                    ctx.start_session(session);
                    navigate("/", Default::default());
                }
                Err(err) => ctx.report(&err),
            }
        });
    };

    view! {
        <form id="signup-form" class="account-form" on:submit=on_submit>
            <h4>"Create Account"</h4>
            <div class="login-input">
                <label for="signup-name">"name"</label>
                <input
                    id="signup-name"
                    autocapitalize="words"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
            </div>
            <div class="login-input">
                <label for="signup-username">"username"</label>
                <input
                    id="signup-username"
                    autocomplete="new-username"
                    prop:value=move || username.get()
                    on:input=move |ev| username.set(event_target_value(&ev))
                />
            </div>
            <div class="login-input">
                <label for="signup-password">"password"</label>
                <input
                    id="signup-password"
                    type="password"
                    autocomplete="new-password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
            </div>
            <button type="submit">"create account"</button>
        </form>
    }
}

#[component]
pub fn SubmitStoryForm() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let navigate = use_navigate();

    let draft = create_rw_signal(NewStory::default());
    let busy = create_rw_signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }

        let session = match ctx.session_untracked() {
            Ok(session) => session,
            Err(err) => return ctx.report(&err),
        };

        busy.set(true);
        let ticket = ctx.issue();
        let navigate = navigate.clone();
        let fields = draft.get_untracked();

        spawn_local(async move {
            let result = submit_new_story(&ServerApi, &session, fields).await;

            busy.try_set(false);
            match result {
                Ok((story, session)) => {
                    ctx.story_created(ticket, story, session, draft);
                    navigate("/", Default::default());
                }
                Err(err) => ctx.report(&err),
            }
        });
    };

    view! {
        <form id="submit-form" on:submit=on_submit>
            <div>
                <label for="create-author">"author"</label>
                <input
                    id="create-author"
                    placeholder="author name"
                    prop:value=move || draft.with(|d| d.author.clone())
                    on:input=move |ev| draft.update(|d| d.author = event_target_value(&ev))
                />
            </div>
            <div>
                <label for="create-title">"title"</label>
                <input
                    id="create-title"
                    placeholder="story title"
                    prop:value=move || draft.with(|d| d.title.clone())
                    on:input=move |ev| draft.update(|d| d.title = event_target_value(&ev))
                />
            </div>
            <div>
                <label for="create-url">"url"</label>
                <input
                    id="create-url"
                    type="url"
                    placeholder="story url"
                    prop:value=move || draft.with(|d| d.url.clone())
                    on:input=move |ev| draft.update(|d| d.url = event_target_value(&ev))
                />
            </div>
            <button type="submit" prop:disabled=move || busy.get()>"submit"</button>
        </form>
    }
}
