use http::status::StatusCode;
use leptos::*;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Error page for routing failures, also used as the router fallback.
#[component]
pub fn ErrorTemplate(
    #[prop(optional)] outside_errors: Option<Errors>,
    #[prop(optional)] errors: Option<RwSignal<Errors>>,
) -> impl IntoView {
    let errors = match outside_errors {
        Some(e) => create_rw_signal(e),
        None => match errors {
            Some(e) => e,
            None => create_rw_signal(Errors::default()),
        },
    };

    let errors = errors.get_untracked();

    let errors: Vec<AppError> = errors
        .into_iter()
        .filter_map(|(_k, v)| v.downcast_ref::<AppError>().cloned())
        .collect();

    // only the first error's status reaches the response
    #[cfg(feature = "ssr")]
    {
        if let (Some(response), Some(first)) = (
            use_context::<leptos_axum::ResponseOptions>(),
            errors.first(),
        ) {
            response.set_status(first.status_code());
        }
    }

    view! {
        <h1>{if errors.len() > 1 { "Errors" } else { "Error" }}</h1>
        <For
            each=move || errors.clone().into_iter().enumerate()
            key=|(index, _)| *index
            children=move |(_, error)| {
                view! {
                    <h2>{error.status_code().to_string()}</h2>
                    <p>"Error: " {error.to_string()}</p>
                    <a href="/">"Back to the stories"</a>
                }
            }
        />
    }
}
