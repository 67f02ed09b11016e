use leptos::*;

use super::{
    feed::{delete_story, toggle_favorite, AppContext, Star},
    hack_or_snooze::{Session, Story, StoryId},
    server::ServerApi,
};

/// Which controls a rendered story carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryControls {
    pub star: Option<Star>,
    pub delete: bool,
}

impl StoryControls {
    /// Stars need a session; delete buttons additionally need the "my stories" view.
    pub fn resolve(session: Option<&Session>, id: &StoryId, include_delete_control: bool) -> Self {
        Self {
            star: session.map(|session| Star::for_story(session, id)),
            delete: include_delete_control && session.is_some(),
        }
    }
}

#[component]
pub fn StoryItem(story: Story, #[prop(optional)] include_delete_control: bool) -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let controls = ctx.current_user.with_untracked(|user| {
        StoryControls::resolve(user.as_ref(), &story.story_id, include_delete_control)
    });

    let star = create_rw_signal(controls.star);

    let star_id = story.story_id.clone();
    let on_star = move |_| {
        let Some(marker) = star.get_untracked() else {
            return;
        };
        let Some(ticket) = ctx.claim(&star_id) else {
            return;
        };

        let id = star_id.clone();
        spawn_local(async move {
            let result = match ctx.session_untracked() {
                Ok(session) => {
                    let stories = ctx.stories.get_untracked();
                    toggle_favorite(&ServerApi, &session, &stories, &id, marker).await
                }
                Err(err) => Err(err),
            };

            ctx.release(&id);
            match result {
                Ok(toggled) => {
                    // The item may be re-rendered away once the session changes.
                    star.try_set(Some(toggled.star));
                    ctx.apply_session(ticket, toggled.session);
                }
                Err(err) => ctx.report(&err),
            }
        });
    };

    let delete_id = story.story_id.clone();
    let on_delete = move |_| {
        let Some(ticket) = ctx.claim(&delete_id) else {
            return;
        };

        let id = delete_id.clone();
        spawn_local(async move {
            let result = match ctx.session_untracked() {
                Ok(session) => delete_story(&ServerApi, &session, &id).await,
                Err(err) => Err(err),
            };

            ctx.release(&id);
            match result {
                Ok(session) => ctx.story_deleted(ticket, &id, session),
                Err(err) => ctx.report(&err),
            }
        });
    };

    let host_name = story.host_name();
    let pending_id = story.story_id.clone();

    view! {
        <li id=story.story_id.to_string() class:pending=move || ctx.is_pending(&pending_id)>
            <div>
                {controls.delete.then(|| view! {
                    <span class="trash-can" on:click=on_delete>
                        <i class="fas fa-trash-alt"></i>
                    </span>
                })}
                {controls.star.is_some().then(|| view! {
                    <span class="star" on:click=on_star>
                        <i class=move || {
                            format!("{} fa-star", star.get().map_or("far", Star::class))
                        }></i>
                    </span>
                })}
                <a href=story.url target="a_blank" class="story-link">
                    {story.title}
                </a>
                <small class="story-hostname">"(" {host_name} ")"</small>
                <div class="story-author">"by " {story.author}</div>
                <div class="story-user">"posted by " {story.username}</div>
            </div>
        </li>
    }
}

/// A list of stories, or `empty_message` when there are none.
#[component]
pub fn StoryListView(
    #[prop(into)] stories: Signal<Vec<Story>>,
    list_id: &'static str,
    empty_message: &'static str,
    #[prop(optional)] include_delete_control: bool,
) -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    view! {
        <ol id=list_id class="stories-list">
            {move || {
                // stars depend on who is logged in
                ctx.current_user.with(|_| ());

                let stories = stories.get();
                if stories.is_empty() {
                    view! { <h5>{empty_message}</h5> }.into_view()
                } else {
                    stories
                        .into_iter()
                        .map(|story| {
                            view! {
                                <StoryItem story=story include_delete_control=include_delete_control/>
                            }
                        })
                        .collect_view()
                }
            }}
        </ol>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::hack_or_snooze::{session, story};

    #[test]
    fn no_controls_without_session() {
        let controls = StoryControls::resolve(None, &"s1".into(), false);
        assert_eq!(
            controls,
            StoryControls {
                star: None,
                delete: false
            }
        );

        assert!(!StoryControls::resolve(None, &"s1".into(), true).delete);
    }

    #[test]
    fn star_variant_follows_session() {
        let mut user = session("ada");
        let id = StoryId::from("s1");

        let controls = StoryControls::resolve(Some(&user), &id, false);
        assert_eq!(controls.star, Some(Star::NotFavorited));
        assert!(!controls.delete);

        user.favorites.push(story("s1", "A"));
        let controls = StoryControls::resolve(Some(&user), &id, true);
        assert_eq!(controls.star, Some(Star::Favorited));
        assert!(controls.delete);
    }

    #[cfg(feature = "ssr")]
    fn render(user: Option<Session>, include_delete_control: bool) -> String {
        leptos::ssr::render_to_string(move || {
            let ctx = AppContext::provide();
            ctx.current_user.set(user.clone());
            view! {
                <StoryItem story=story("s1", "A") include_delete_control=include_delete_control/>
            }
        })
        .to_string()
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn logged_out_markup_has_no_controls() {
        let html = render(None, false);

        assert!(html.contains("story-link"));
        assert!(html.contains("story-hostname"));
        assert!(!html.contains("fa-star"));
        assert!(!html.contains("trash-can"));
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn favorite_renders_filled_star() {
        let mut user = session("ada");
        assert!(render(Some(user.clone()), false).contains("far fa-star"));

        user.favorites.push(story("s1", "A"));
        let html = render(Some(user), true);
        assert!(html.contains("fas fa-star"));
        assert!(html.contains("trash-can"));
    }
}
