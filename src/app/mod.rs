pub mod feed;
pub mod forms;
pub mod hack_or_snooze;
pub mod server;
pub mod session;
pub mod story;

use crate::error_template::{AppError, ErrorTemplate};
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use self::{
    feed::{fetch_initial_stories, AppContext, FeedError},
    forms::{LoginForm, SignupForm, SubmitStoryForm},
    hack_or_snooze::StoryList,
    server::ServerApi,
    session::{BrowserCredentials, SessionManager},
    story::StoryListView,
};

/// Resolves once the remembered user (if any) is restored and the feed is fetched.
type Startup = Resource<(), Result<StoryList, FeedError>>;

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    let ctx = AppContext::provide();
    let credentials = BrowserCredentials::new();
    provide_context(credentials.clone());

    let startup: Startup = create_local_resource(
        || (),
        move |_| {
            let credentials = credentials.clone();
            async move {
                if let Some(session) = SessionManager::new(&ServerApi, &credentials)
                    .restore_from_storage()
                    .await
                {
                    ctx.start_session(session);
                }

                fetch_initial_stories(&ServerApi).await
            }
        },
    );
    provide_context(startup);

    create_effect(move |_| match startup.get() {
        Some(Ok(stories)) => ctx.stories.set(stories),
        Some(Err(err)) => ctx.report(&err),
        None => {}
    });

    view! {
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/hack-or-snooze.css"/>
        <Stylesheet href="https://use.fontawesome.com/releases/v5.3.1/css/all.css"/>

        <Title text="Hack or Snooze"/>

        <Router fallback=|| {
            let mut outside_errors = Errors::default();
            outside_errors.insert_with_default_key(AppError::NotFound);
            view! {
                <ErrorTemplate outside_errors/>
            }
            .into_view()
        }>
            <Nav/>
            <ErrorBanner/>
            <main>
                <Routes>
                    <Route path="" view=HomePage/>
                    <Route path="/submit" view=SubmitPage/>
                    <Route path="/favorites" view=FavoritesPage/>
                    <Route path="/my-stories" view=MyStoriesPage/>
                    <Route path="/login" view=LoginPage/>
                    <Route path="/profile" view=ProfilePage/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn Nav() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let credentials = expect_context::<BrowserCredentials>();

    let on_logout = move |ev: ev::MouseEvent| {
        ev.prevent_default();

        SessionManager::new(&ServerApi, &credentials).logout();
        ctx.end_session();

        if let Err(err) = window().location().reload() {
            logging::warn!("page reload failed: {err:?}");
        }
    };

    let username = move || {
        ctx.current_user
            .with(|user| user.as_ref().map(|user| user.username.clone()))
    };

    view! {
        <nav>
            <div class="navbar-brand">
                <A href="/">"Hack or Snooze"</A>
            </div>
            <Show
                when=move || ctx.is_logged_in()
                fallback=|| view! {
                    <div class="nav-right">
                        <A href="/login">"login/signup"</A>
                    </div>
                }
            >
                <div class="main-nav-links">
                    <A href="/submit">"submit"</A>
                    " | "
                    <A href="/favorites">"favorites"</A>
                    " | "
                    <A href="/my-stories">"my stories"</A>
                </div>
                <div class="nav-right">
                    <A href="/profile">{username}</A>
                    " "
                    <a id="nav-logout" href="#" on:click=on_logout.clone()>
                        <small>"(logout)"</small>
                    </a>
                </div>
            </Show>
        </nav>
    }
}

#[component]
fn ErrorBanner() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    move || {
        ctx.error.get().map(|message| {
            view! {
                <div class="error-banner" role="alert">
                    {message}
                    <button on:click=move |_| ctx.dismiss_error()>"dismiss"</button>
                </div>
            }
        })
    }
}

/// Renders the public feed.
#[component]
fn HomePage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let startup = expect_context::<Startup>();

    let stories = Signal::derive(move || {
        ctx.stories
            .with(|list| list.iter().cloned().collect::<Vec<_>>())
    });

    view! {
        <Suspense fallback=|| view! { <p id="stories-loading-msg">"Loading..."</p> }>
            {move || startup.get().map(|_| view! {
                <StoryListView
                    stories=stories
                    list_id="all-stories-list"
                    empty_message="No stories yet!"
                />
            })}
        </Suspense>
    }
}

#[component]
fn LoginRequired(children: ChildrenFn) -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    view! {
        <Show
            when=move || ctx.is_logged_in()
            fallback=|| view! { <p>"Log in to see this page."</p> }
        >
            {children()}
        </Show>
    }
}

#[component]
fn SubmitPage() -> impl IntoView {
    view! {
        <LoginRequired>
            <SubmitStoryForm/>
        </LoginRequired>
    }
}

#[component]
fn FavoritesPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let favorites = Signal::derive(move || {
        ctx.current_user
            .with(|user| user.as_ref().map(|user| user.favorites.clone()).unwrap_or_default())
    });

    view! {
        <LoginRequired>
            <StoryListView
                stories=favorites
                list_id="favorited-stories"
                empty_message="No favorites added!"
            />
        </LoginRequired>
    }
}

#[component]
fn MyStoriesPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let own_stories = Signal::derive(move || {
        ctx.current_user
            .with(|user| user.as_ref().map(|user| user.own_stories.clone()).unwrap_or_default())
    });

    view! {
        <LoginRequired>
            <StoryListView
                stories=own_stories
                list_id="my-stories"
                empty_message="No stories added by user yet!"
                include_delete_control=true
            />
        </LoginRequired>
    }
}

#[component]
fn LoginPage() -> impl IntoView {
    view! {
        <LoginForm/>
        <SignupForm/>
    }
}

#[component]
fn ProfilePage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    view! {
        <LoginRequired>
            {move || ctx.current_user.get().map(|user| view! {
                <section id="user-profile">
                    <h4>"User Profile Info"</h4>
                    <div id="profile-name">"Name: " {user.name.clone()}</div>
                    <div id="profile-username">"Username: " {user.username.clone()}</div>
                    <div id="profile-account-date">
                        "Account Created: " {user.account_date().to_string()}
                    </div>
                </section>
            })}
        </LoginRequired>
    }
}
