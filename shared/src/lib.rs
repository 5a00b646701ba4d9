#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]

pub mod capabilities;
pub mod config;
pub mod encoding;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod model;
pub mod remote;
pub mod session;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::Config;
pub use error::{ErrorKind, OperationError, OperationResult};
pub use event::{Event, Secret};
pub use lifecycle::{Lifecycle, Outcome, Ticket};
pub use model::Model;
pub use view::ViewModel;

pub const CREDENTIALS_REQUIRED: &str = remote::Credentials::REQUIRED_MESSAGE;
pub const SEARCH_PROMPT_REQUIRED: &str = "Please enter a search prompt.";
pub const EDIT_INPUT_REQUIRED: &str = "Please select an image and enter a prompt.";

pub mod app {
    use super::*;
    use crate::capabilities::{FileReadResult, FileRef};
    use crate::encoding::EncodedImage;
    use crate::model::{AuthAttempt, AuthMode};
    use crate::remote::{Credentials, SearchAnswer};
    use crate::session::{Identity, Screen, SocialProvider};

    #[derive(Default)]
    pub struct App;

    // Every handler returns whether the model changed; `update` renders only
    // then.
    impl App {
        fn configure(model: &mut Model, config: Config) -> bool {
            if model.configured {
                tracing::warn!("configuration already applied, ignoring");
                return false;
            }
            match config.validated() {
                Ok(config) => {
                    tracing::info!(
                        auth_base_url = %config.auth_base_url,
                        search_model = %config.search_model,
                        image_model = %config.image_model,
                        "configured"
                    );
                    model.config = config;
                    model.configured = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rejecting configuration, keeping defaults");
                }
            }
            false
        }

        fn toggle_auth_mode(model: &mut Model) -> bool {
            if model.session.is_authenticated() || model.auth.request.is_pending() {
                return false;
            }
            model.auth.mode = model.auth.mode.toggle();
            model.auth.request.reset();
            true
        }

        fn submit_credentials(
            model: &mut Model,
            username: String,
            password: Secret,
            caps: &Capabilities,
        ) -> bool {
            if model.session.is_authenticated() {
                tracing::debug!("ignoring credentials while signed in");
                return false;
            }

            let credentials = match Credentials::new(username, password) {
                Ok(credentials) => credentials,
                Err(e) => {
                    model.auth.attempt = None;
                    model.auth.request.reject(e.message);
                    return true;
                }
            };

            let mode = model.auth.mode;
            let ticket = model.auth.request.begin();
            model.auth.attempt = Some(AuthAttempt::Credentials(mode));

            let settled = move |result: OperationResult<Identity>| Event::AuthSettled {
                ticket,
                result: Box::new(result),
            };
            let dispatched = match mode {
                AuthMode::Login => {
                    remote::login(&caps.http, &model.config, &credentials, settled)
                }
                AuthMode::Signup => {
                    remote::signup(&caps.http, &model.config, &credentials, settled)
                }
            };
            if let Err(e) = dispatched {
                model.auth.request.settle(ticket, Err(e));
            }
            true
        }

        fn request_social_login(
            model: &mut Model,
            provider: SocialProvider,
            caps: &Capabilities,
        ) -> bool {
            if model.session.is_authenticated() {
                return false;
            }

            let ticket = model.auth.request.begin();
            model.auth.attempt = Some(AuthAttempt::Social(provider));

            let dispatched = remote::social_login(&caps.http, &model.config, provider, move |result| {
                Event::AuthSettled {
                    ticket,
                    result: Box::new(result),
                }
            });
            if let Err(e) = dispatched {
                model.auth.request.settle(ticket, Err(e));
            }
            true
        }

        fn settle_auth(model: &mut Model, ticket: Ticket, result: OperationResult<Identity>) -> bool {
            if !model.auth.request.settle(ticket, result) {
                return false;
            }
            model.auth.attempt = None;

            match model.auth.request.outcome() {
                Outcome::Success(identity) => {
                    let identity = identity.clone();
                    model.session.sign_in(identity);
                }
                Outcome::Failure(error) => {
                    tracing::warn!(code = error.code(), message = %error.message, "authentication failed");
                }
                _ => {}
            }
            true
        }

        fn logout(model: &mut Model) -> bool {
            if !model.session.is_authenticated() {
                return false;
            }
            model.clear_user_state();
            true
        }

        fn navigate(model: &mut Model, screen: Screen) -> bool {
            if model.session.screen() == screen {
                return false;
            }
            model.session.navigate(screen)
        }

        fn submit_search(model: &mut Model, caps: &Capabilities) -> bool {
            if !model.session.is_authenticated() {
                return false;
            }
            if model.search.prompt.trim().is_empty() {
                model.search.request.reject(SEARCH_PROMPT_REQUIRED);
                return true;
            }

            let ticket = model.search.request.begin();
            let dispatched = remote::grounded_search(
                &caps.http,
                &model.config,
                &model.search.prompt,
                move |result| Event::SearchSettled {
                    ticket,
                    result: Box::new(result),
                },
            );
            if let Err(e) = dispatched {
                model.search.request.settle(ticket, Err(e));
            }
            true
        }

        fn settle_search(
            model: &mut Model,
            ticket: Ticket,
            result: OperationResult<SearchAnswer>,
        ) -> bool {
            if let Err(e) = &result {
                tracing::warn!(code = e.code(), message = %e.message, "search failed");
            }
            model.search.request.settle(ticket, result)
        }

        fn select_image(model: &mut Model, file: FileRef, caps: &Capabilities) -> bool {
            if !model.session.is_authenticated() {
                return false;
            }

            tracing::info!(name = %file.name, mime_type = %file.mime_type, "reading selected image");
            let screen = &mut model.image_edit;
            screen.selected = Some(file.clone());
            screen.edit.reset();
            let ticket = screen.source.begin();

            caps.file_reader.read(file, move |result| Event::ImageRead {
                ticket,
                result: Box::new(result),
            });
            true
        }

        fn image_read(model: &mut Model, ticket: Ticket, result: FileReadResult) -> bool {
            let declared = model
                .image_edit
                .selected
                .as_ref()
                .map(|file| file.mime_type.clone())
                .unwrap_or_default();

            let encoded = result
                .map_err(OperationError::from)
                .and_then(|contents| {
                    let mime = if contents.mime_type.trim().is_empty() {
                        declared.as_str()
                    } else {
                        contents.mime_type.as_str()
                    };
                    EncodedImage::from_bytes(mime, &contents.bytes).map_err(OperationError::from)
                });

            if let Err(e) = &encoded {
                tracing::warn!(code = e.code(), message = %e.message, "could not load selected image");
            }
            model.image_edit.source.settle(ticket, encoded)
        }

        fn submit_edit(model: &mut Model, caps: &Capabilities) -> bool {
            if !model.session.is_authenticated() {
                return false;
            }

            let screen = &mut model.image_edit;
            let source = screen
                .source_image()
                .filter(|_| !screen.prompt.trim().is_empty())
                .cloned();
            let Some(source) = source else {
                screen.edit.reject(EDIT_INPUT_REQUIRED);
                return true;
            };

            let ticket = screen.edit.begin();
            let dispatched = remote::edit_image(
                &caps.http,
                &model.config,
                &source,
                &screen.prompt,
                move |result| Event::EditSettled {
                    ticket,
                    result: Box::new(result),
                },
            );
            if let Err(e) = dispatched {
                screen.edit.settle(ticket, Err(e));
            }
            true
        }

        fn settle_edit(
            model: &mut Model,
            ticket: Ticket,
            result: OperationResult<EncodedImage>,
        ) -> bool {
            if let Err(e) = &result {
                tracing::warn!(code = e.code(), message = %e.message, "image edit failed");
            }
            model.image_edit.edit.settle(ticket, result)
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let event_name = event.name();
            if event.is_user_initiated() {
                tracing::debug!(event = event_name, "user action");
            }

            let changed = match event {
                Event::Configure(config) => Self::configure(model, *config),

                Event::AuthModeToggled => Self::toggle_auth_mode(model),

                Event::CredentialsSubmitted { username, password } => {
                    Self::submit_credentials(model, username, password, caps)
                }

                Event::SocialLoginRequested { provider } => {
                    Self::request_social_login(model, provider, caps)
                }

                Event::LogoutRequested => Self::logout(model),

                Event::Navigate { screen } => Self::navigate(model, screen),

                Event::SearchPromptChanged { prompt } => {
                    model.search.prompt = prompt;
                    true
                }

                Event::SearchSubmitted => Self::submit_search(model, caps),

                Event::ImageSelected { file } => Self::select_image(model, file, caps),

                Event::EditPromptChanged { prompt } => {
                    model.image_edit.prompt = prompt;
                    true
                }

                Event::EditSubmitted => Self::submit_edit(model, caps),

                Event::AuthSettled { ticket, result } => Self::settle_auth(model, ticket, *result),

                Event::SearchSettled { ticket, result } => {
                    Self::settle_search(model, ticket, *result)
                }

                Event::ImageRead { ticket, result } => Self::image_read(model, ticket, *result),

                Event::EditSettled { ticket, result } => Self::settle_edit(model, ticket, *result),
            };

            if changed {
                tracing::debug!(event = event_name, "rendering");
                caps.render.render();
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            view::compose(model)
        }
    }
}
