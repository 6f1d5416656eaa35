use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, stack, text, Canvas};
use iced::{keyboard, time, Alignment, ContentFit, Element, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use swipe_cull::config::Settings;
use swipe_cull::deck::{DeckEvent, Direction, GestureEvent};
use swipe_cull::error::StoreError;
use swipe_cull::logging;
use swipe_cull::state::data::{AssetPage, ListRequest};
use swipe_cull::state::permission::{FolderAccess, PermissionProvider, PermissionStatus};
use swipe_cull::state::session::Session;
use swipe_cull::store::catalog::CatalogStore;
use swipe_cull::store::scan::ImportResult;
use swipe_cull::store::MediaStore;

mod ui;

/// Main application state
struct SwipeCull {
    /// The folder catalog, shared with background tasks
    store: Arc<CatalogStore>,
    session: Session,
    access: FolderAccess,
    /// Time of the previous animation frame
    last_frame: Option<Instant>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Choose Folder"
    ChooseFolder,
    /// User asked to replace a read-only folder with another one
    BroadenSelection,
    /// Background import completed
    ImportComplete(Result<ImportResult, StoreError>),
    Refresh,
    Refreshed(Result<AssetPage, StoreError>),
    LoadedMore(Result<AssetPage, StoreError>),
    /// Pointer input from the card canvas
    Gesture {
        event: GestureEvent,
        viewport_width: f32,
    },
    /// Keep/reject from a button or arrow key
    Commit(Direction),
    Undo,
    Purge,
    Purged(Result<(), StoreError>),
    Frame(Instant),
    DismissError,
}

impl SwipeCull {
    fn new(settings: Settings, store: Arc<CatalogStore>) -> (Self, Task<Message>) {
        let asset_count = store.asset_count().unwrap_or(0);
        info!(assets = asset_count, "🎨 Swipe Cull initialized");

        let status = format!("Ready. {asset_count} items in the catalog. Choose a folder to start.");

        (
            SwipeCull {
                store,
                session: Session::new(&settings),
                access: FolderAccess::new(),
                last_frame: None,
                status,
            },
            Task::none(),
        )
    }

    fn fetch(
        &self,
        request: ListRequest,
        on_done: fn(Result<AssetPage, StoreError>) -> Message,
    ) -> Task<Message> {
        let store = self.store.clone();
        Task::perform(async move { store.list_assets(&request).await }, on_done)
    }

    /// Import the chosen folder and load it, or record why it cannot be read
    fn open_folder(&mut self, permission: PermissionStatus) -> Task<Message> {
        let Some(folder) = self.access.root().map(PathBuf::from) else {
            return Task::none();
        };

        if !permission.can_load() {
            self.session.start(permission);
            self.status = format!("Cannot read {}", folder.display());
            return Task::none();
        }

        self.status = format!("Importing from {}...", folder.display());
        self.session
            .feed_mut()
            .set_album(Some(folder.to_string_lossy().to_string()));

        let store = self.store.clone();
        Task::perform(
            async move { store.import_folder(folder).await },
            Message::ImportComplete,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ChooseFolder => {
                let permission = self.access.request();
                self.open_folder(permission)
            }
            Message::BroadenSelection => {
                let permission = self.access.broaden_selection();
                self.open_folder(permission)
            }
            Message::ImportComplete(result) => {
                match result {
                    Ok(result) => {
                        self.status = format!(
                            "✅ Import complete! Added {}, skipped {} already known.",
                            result.imported_count, result.skipped_count
                        );
                    }
                    Err(err) => {
                        error!(error = %err, "import failed");
                        self.status = format!("⚠️  Import failed: {err}");
                    }
                }
                // The catalog may still hold rows from an earlier import
                match self.session.start(self.access.status()) {
                    Some(request) => self.fetch(request, Message::Refreshed),
                    None => Task::none(),
                }
            }
            Message::Refresh => {
                if !self.access.status().can_load() {
                    return Task::none();
                }
                let request = self.session.begin_refresh();
                self.fetch(request, Message::Refreshed)
            }
            Message::Refreshed(result) => {
                self.session.finish_refresh(result);
                let feed = self.session.feed();
                self.status = format!("{} items loaded", feed.len());
                Task::none()
            }
            Message::LoadedMore(result) => {
                let added = self.session.finish_load_more(result);
                if added > 0 {
                    info!(added, total = self.session.feed().len(), "page appended");
                }
                Task::none()
            }
            Message::Gesture {
                event,
                viewport_width,
            } => {
                self.session.set_viewport_width(viewport_width);
                self.session.gesture(event);
                Task::none()
            }
            Message::Commit(direction) => {
                self.session.commit(direction);
                Task::none()
            }
            Message::Undo => {
                if let Some(id) = self.session.undo() {
                    self.status = format!("Restored {id}");
                }
                Task::none()
            }
            Message::Purge => {
                let Some(ids) = self.session.begin_purge() else {
                    return Task::none();
                };
                self.status = format!("Deleting {} items...", ids.len());
                let store = self.store.clone();
                Task::perform(
                    async move { store.delete_assets(&ids).await },
                    Message::Purged,
                )
            }
            Message::Purged(result) => {
                let outcome = self.session.finish_purge(result);
                self.status = if outcome.failed_ids.is_empty() {
                    format!("🗑️  Deleted {} items", outcome.success_ids.len())
                } else {
                    warn!(failed = outcome.failed_ids.len(), "purge rolled back");
                    format!("⚠️  Could not delete {} items", outcome.failed_ids.len())
                };
                Task::none()
            }
            Message::Frame(now) => {
                let dt = self
                    .last_frame
                    .map(|last| now.saturating_duration_since(last))
                    .unwrap_or_default();
                self.last_frame = Some(now);

                let tick = self.session.tick(dt, now);
                for event in &tick.events {
                    if let DeckEvent::Swiped { direction, item } = event {
                        info!(id = %item.id, ?direction, "swiped");
                    }
                }
                if !self.session.needs_frames() {
                    self.last_frame = None;
                }

                match tick.load {
                    Some(request) => self.fetch(request, Message::LoadedMore),
                    None => Task::none(),
                }
            }
            Message::DismissError => {
                self.session.feed_mut().reset_error();
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let view = self.session.view();
        let busy = view.purging || view.loading_initial;

        let card: Element<Message> = match view.current {
            Some(item) => stack![
                iced::widget::image(Handle::from_path(&item.uri))
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Contain),
                Canvas::new(ui::card::CardCanvas::from_view(&view))
                    .width(Length::Fill)
                    .height(Length::Fill),
            ]
            .into(),
            None if view.loading_initial && self.access.root().is_some() => {
                text("Loading library...").size(20).into()
            }
            None if view.total == 0 => text("Nothing to sort here.").size(20).into(),
            None => text("🎉 All done! Purge to free up space.").size(20).into(),
        };

        let controls = row![
            button("✗ Delete")
                .on_press_maybe((!busy && !view.is_exhausted()).then_some(Message::Commit(Direction::Left)))
                .padding(10),
            button("↶ Undo")
                .on_press_maybe((!busy && view.queue_count > 0).then_some(Message::Undo))
                .padding(10),
            button("✓ Keep")
                .on_press_maybe((!busy && !view.is_exhausted()).then_some(Message::Commit(Direction::Right)))
                .padding(10),
            button(text(format!("Purge ({})", view.queue_count)))
                .on_press_maybe((!busy && view.queue_count > 0).then_some(Message::Purge))
                .padding(10),
        ]
        .spacing(10);

        let progress = text(format!(
            "{} / {}{}",
            view.cursor.min(view.total),
            view.total,
            if view.loading_more { " (loading more...)" } else { "" }
        ))
        .size(14);

        let header = row![
            text("Swipe Cull").size(32),
            button("Choose Folder").on_press(Message::ChooseFolder).padding(8),
            button("Choose Another Folder")
                .on_press_maybe(
                    (self.access.status() == PermissionStatus::Limited)
                        .then_some(Message::BroadenSelection),
                )
                .padding(8),
            button("Refresh")
                .on_press_maybe((!busy).then_some(Message::Refresh))
                .padding(8),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let mut content = column![
            header,
            text(&self.status).size(16),
            container(card)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill),
            progress,
            controls,
        ]
        .spacing(16)
        .padding(24)
        .align_x(Alignment::Center);

        if let Some(err) = view.error {
            content = content.push(
                row![
                    text(format!("⚠️  {err}")).size(14),
                    button("Dismiss").on_press(Message::DismissError),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            );
        }

        content.into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(|key, modifiers| match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => {
                Some(Message::Commit(Direction::Left))
            }
            keyboard::Key::Named(keyboard::key::Named::ArrowRight) => {
                Some(Message::Commit(Direction::Right))
            }
            keyboard::Key::Character("z") if modifiers.command() => Some(Message::Undo),
            _ => None,
        });

        if self.session.needs_frames() {
            Subscription::batch([keys, time::every(Duration::from_millis(16)).map(Message::Frame)])
        } else {
            keys
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };
    logging::init_logging(&settings.logging)?;
    if let Some(err) = settings_error {
        warn!(error = %err, "using default settings");
    }

    let store = Arc::new(CatalogStore::open_default()?);

    iced::application("Swipe Cull", SwipeCull::update, SwipeCull::view)
        .subscription(SwipeCull::subscription)
        .theme(SwipeCull::theme)
        .centered()
        .run_with(move || SwipeCull::new(settings, store))?;
    Ok(())
}
