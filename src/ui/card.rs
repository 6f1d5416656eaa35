use iced::alignment;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Radians, Rectangle, Renderer, Size, Theme, Vector};

use swipe_cull::deck::GestureEvent;
use swipe_cull::state::session::DeckView;

use crate::Message;

/// Card overlay drawn over the current photo.
///
/// Draws the card outline at the drag offset and tilt, the keep/delete
/// labels, and the edge of the next card; turns mouse input into deck
/// gesture events.
pub struct CardCanvas {
    pub offset: Vector,
    pub rotation_deg: f32,
    pub left_opacity: f32,
    pub right_opacity: f32,
    pub next_scale: f32,
    pub has_next: bool,
    pub caption: String,
}

impl CardCanvas {
    pub fn from_view(view: &DeckView<'_>) -> Self {
        let caption = view
            .current
            .map(|item| item.filename.clone().unwrap_or_else(|| item.id.clone()))
            .unwrap_or_default();
        Self {
            offset: Vector::new(view.position.x, view.position.y),
            rotation_deg: view.signals.rotation_deg,
            left_opacity: view.signals.left_opacity,
            right_opacity: view.signals.right_opacity,
            next_scale: view.signals.next_card_scale,
            has_next: view.next.is_some(),
            caption,
        }
    }
}

fn label(content: &str, position: Point, color: Color) -> canvas::Text {
    canvas::Text {
        content: content.to_string(),
        position,
        color,
        size: Pixels(28.0),
        horizontal_alignment: alignment::Horizontal::Center,
        vertical_alignment: alignment::Vertical::Center,
        ..canvas::Text::default()
    }
}

impl Program<Message> for CardCanvas {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let card = Size::new(bounds.width * 0.9, bounds.height * 0.9);
        let center = frame.center();

        // Next card peeks out underneath
        if self.has_next {
            let next = Size::new(card.width * self.next_scale, card.height * self.next_scale);
            let outline = Path::rectangle(
                Point::new(center.x - next.width / 2.0, center.y - next.height / 2.0 + 10.0),
                next,
            );
            frame.stroke(
                &outline,
                Stroke::default()
                    .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.25))
                    .with_width(2.0),
            );
        }

        frame.with_save(|frame| {
            frame.translate(Vector::new(center.x + self.offset.x, center.y + self.offset.y));
            frame.rotate(Radians(self.rotation_deg.to_radians()));

            let top_left = Point::new(-card.width / 2.0, -card.height / 2.0);
            frame.stroke(
                &Path::rectangle(top_left, card),
                Stroke::default().with_color(Color::WHITE).with_width(3.0),
            );

            if self.left_opacity > 0.0 {
                frame.fill_text(label(
                    "DELETE",
                    Point::new(top_left.x + card.width * 0.8, top_left.y + 40.0),
                    Color::from_rgba(0.95, 0.25, 0.25, self.left_opacity),
                ));
            }
            if self.right_opacity > 0.0 {
                frame.fill_text(label(
                    "KEEP",
                    Point::new(top_left.x + card.width * 0.2, top_left.y + 40.0),
                    Color::from_rgba(0.3, 0.9, 0.4, self.right_opacity),
                ));
            }

            frame.fill_text(canvas::Text {
                content: self.caption.clone(),
                position: Point::new(0.0, card.height / 2.0 - 20.0),
                color: Color::from_rgba(1.0, 1.0, 1.0, 0.8),
                size: Pixels(14.0),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let gesture = |event| Message::Gesture {
            event,
            viewport_width: bounds.width,
        };

        match event {
            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if cursor.position_in(bounds).is_some() {
                    if let Some(pos) = cursor.position() {
                        state.is_dragging = true;
                        state.last_position = Some(pos);
                        return (
                            canvas::event::Status::Captured,
                            Some(gesture(GestureEvent::Start(to_vector(pos)))),
                        );
                    }
                }
            }

            // Mouse move - follow the pointer while dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    state.last_position = Some(position);
                    return (
                        canvas::event::Status::Captured,
                        Some(gesture(GestureEvent::Move(to_vector(position)))),
                    );
                }
            }

            // Mouse button release - let the deck decide commit or cancel
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    // Pointer may have left the window: release where it was last seen
                    let released = cursor.position().or(state.last_position.take());
                    return (
                        canvas::event::Status::Captured,
                        released.map(|pos| gesture(GestureEvent::Release(to_vector(pos)))),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }
}

fn to_vector(point: Point) -> cgmath::Vector2<f32> {
    cgmath::Vector2::new(point.x, point.y)
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    /// Last pointer position seen during the drag
    pub last_position: Option<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardCanvas {
        CardCanvas {
            offset: Vector::new(0.0, 0.0),
            rotation_deg: 0.0,
            left_opacity: 0.0,
            right_opacity: 0.0,
            next_scale: 0.96,
            has_next: false,
            caption: String::new(),
        }
    }

    fn bounds() -> Rectangle {
        Rectangle::new(Point::ORIGIN, Size::new(800.0, 600.0))
    }

    fn mouse(event: mouse::Event) -> canvas::Event {
        canvas::Event::Mouse(event)
    }

    #[test]
    fn test_release_outside_window_uses_last_seen_position() {
        let card = card();
        let mut state = DragState::default();

        let (_, message) = card.update(
            &mut state,
            mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds(),
            Cursor::Available(Point::new(500.0, 300.0)),
        );
        assert!(matches!(message, Some(Message::Gesture { event: GestureEvent::Start(_), .. })));

        card.update(
            &mut state,
            mouse(mouse::Event::CursorMoved { position: Point::new(520.0, 310.0) }),
            bounds(),
            Cursor::Available(Point::new(520.0, 310.0)),
        );

        let (status, message) = card.update(
            &mut state,
            mouse(mouse::Event::ButtonReleased(mouse::Button::Left)),
            bounds(),
            Cursor::Unavailable,
        );
        assert_eq!(status, canvas::event::Status::Captured);
        match message {
            Some(Message::Gesture { event: GestureEvent::Release(at), .. }) => {
                assert_eq!(at, cgmath::Vector2::new(520.0, 310.0));
            }
            other => panic!("expected a release gesture, got {other:?}"),
        }
        assert!(!state.is_dragging);
    }

    #[test]
    fn test_release_without_move_lands_on_press_point() {
        let card = card();
        let mut state = DragState::default();

        card.update(
            &mut state,
            mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds(),
            Cursor::Available(Point::new(500.0, 300.0)),
        );
        let (_, message) = card.update(
            &mut state,
            mouse(mouse::Event::ButtonReleased(mouse::Button::Left)),
            bounds(),
            Cursor::Unavailable,
        );

        match message {
            Some(Message::Gesture { event: GestureEvent::Release(at), .. }) => {
                assert_eq!(at, cgmath::Vector2::new(500.0, 300.0));
            }
            other => panic!("expected a release gesture, got {other:?}"),
        }
    }

    #[test]
    fn test_release_without_drag_is_ignored() {
        let card = card();
        let mut state = DragState::default();

        let (status, message) = card.update(
            &mut state,
            mouse(mouse::Event::ButtonReleased(mouse::Button::Left)),
            bounds(),
            Cursor::Unavailable,
        );
        assert_eq!(status, canvas::event::Status::Ignored);
        assert!(message.is_none());
    }
}
