//! An editing session: one value bound to one live surface.
//!
//! The session turns surface events (input, selection changes, keys,
//! clipboard) into value operations and re-applies the result through the
//! reconciler. Everything outside the editor itself, such as persisting
//! changes, undo history and splitting a block in two, goes through a
//! [`SessionHost`].
//!
//! Surface events are filtered through [`Phase`] so nothing is read back
//! while an input method is composing.

mod phase;
mod undo;

pub use phase::{Action, Event, Phase};
pub use undo::UndoDebounce;

use std::time::{Duration, Instant};

use crate::editing::{
    Toggle, get_active_formats, indent_list_items, insert, insert_line_separator, remove,
    remove_line_separator, slice, split_at, toggle_format, update_formats,
};
use crate::registry::FormatRegistry;
use crate::surface::{self, Dom, NodeId};
use crate::tree::{TreeOptions, to_html_string};
use crate::value::{
    CreateOptions, Format, LINE_SEPARATOR, Source, Value, create, create_from_markup,
};

/// Browser input types that would format or restructure the surface on
/// their own. The current value is re-applied over them.
const IGNORED_INPUT_TYPES: &[&str] = &[
    "historyUndo",
    "historyRedo",
    "insertParagraph",
    "insertOrderedList",
    "insertUnorderedList",
    "insertHorizontalRule",
    "insertLink",
];

/// Everything the session needs from whoever embeds it.
pub trait SessionHost {
    /// The value changed; `markup` is its serialized form.
    fn value_changed(&mut self, value: &Value, markup: &str);

    fn selection_changed(&mut self, start: Option<usize>, end: Option<usize>);

    fn create_undo_level(&mut self);

    /// Text for assistive technology.
    fn announce(&mut self, _message: &str) {}

    /// Enter asked to split the value. Return `false` to let the session
    /// insert a line break instead.
    fn split(&mut self, _before: &Value, _after: &Value) -> bool {
        false
    }

    /// A paste that did not come from a session. Return a value to insert
    /// it instead of the payload's own content.
    fn transform_paste(&mut self, _payload: &ClipboardPayload) -> Option<Value> {
        None
    }
}

/// What copy and cut put on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub plain_text: String,
    pub html: String,
    /// Set on payloads a session produced.
    pub rich_text: bool,
}

impl ClipboardPayload {
    /// A payload from somewhere else.
    pub fn foreign(plain_text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            plain_text: plain_text.into(),
            html: html.into(),
            rich_text: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub multiline_tag: Option<String>,
    pub multiline_wrapper_tags: Vec<String>,
    pub preserve_white_space: bool,
    pub undo_debounce: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            multiline_tag: None,
            multiline_wrapper_tags: Vec::new(),
            preserve_white_space: false,
            undo_debounce: Duration::from_millis(1000),
        }
    }
}

impl EditorSettings {
    pub fn multiline(tag: &str) -> Self {
        let create = CreateOptions::multiline(tag);
        Self {
            multiline_tag: create.multiline_tag,
            multiline_wrapper_tags: create.multiline_wrapper_tags,
            ..Self::default()
        }
    }

    pub fn create_options(&self, is_editable_tree: bool) -> CreateOptions {
        CreateOptions {
            multiline_tag: self.multiline_tag.clone(),
            multiline_wrapper_tags: self.multiline_wrapper_tags.clone(),
            preserve_white_space: self.preserve_white_space,
            is_editable_tree,
        }
    }

    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            multiline_tag: self.multiline_tag.clone(),
            preserve_white_space: self.preserve_white_space,
            is_editable_tree: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Backspace,
    Delete,
    Space,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            alt: false,
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn has_modifier(&self) -> bool {
        self.shift || self.alt || self.ctrl || self.meta
    }
}

/// Whether the session consumed a key or the surface should act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Native,
}

pub struct Session {
    value: Value,
    registry: FormatRegistry,
    settings: EditorSettings,
    phase: Phase,
    undo: UndoDebounce,
    surface: Dom,
    scratch: Dom,
    markup: String,
    last_checkpoint: String,
}

impl Session {
    /// Start editing `value` on a fresh surface.
    pub fn new(value: Value, registry: FormatRegistry, settings: EditorSettings) -> Self {
        let markup = to_html_string(&value, settings.multiline_tag.as_deref(), &registry);
        let mut session = Self {
            value,
            registry,
            undo: UndoDebounce::new(settings.undo_debounce),
            settings,
            phase: Phase::Idle,
            surface: Dom::new(),
            scratch: Dom::new(),
            last_checkpoint: markup.clone(),
            markup,
        };
        session.apply(false);
        session
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &Dom {
        &self.surface
    }

    /// The live surface, for whatever edits it outside the session.
    pub fn surface_mut(&mut self) -> &mut Dom {
        &mut self.surface
    }

    pub fn root(&self) -> NodeId {
        self.surface.root()
    }

    /// Read the live surface and its selection back into a value.
    pub fn read_surface(&self) -> Value {
        let source = Source::Element {
            dom: &self.surface,
            root: self.surface.root(),
            range: self.surface.selection(),
        };
        create(source, &self.settings.create_options(true), &self.registry)
    }

    /// Replace the value from outside, keeping the pending formats at the
    /// caret.
    pub fn set_value(&mut self, mut value: Value) {
        if let Some(caret) = value.start.filter(|_| value.is_collapsed() == Some(true)) {
            let active = self.value.active_formats.clone().unwrap_or_default();
            update_formats(&mut value, caret, caret, &active);
        }
        self.value = value;
        self.markup = self.serialize(&self.value);
        self.apply(false);
    }

    pub fn on_input(&mut self, host: &mut dyn SessionHost, input_type: Option<&str>, now: Instant) {
        match self.step(Event::Input) {
            Action::Suppress | Action::Nothing => {
                log::debug!("input suppressed in {:?}", self.phase);
                return;
            }
            Action::SyncThenProcess => self.sync(host, now),
            Action::Process | Action::Sync => {}
        }
        self.process_input(host, input_type, now);
    }

    pub fn on_selection_change(&mut self, host: &mut dyn SessionHost, now: Instant) {
        match self.step(Event::SelectionChange) {
            Action::Suppress | Action::Nothing => return,
            Action::SyncThenProcess => self.sync(host, now),
            Action::Process | Action::Sync => {}
        }

        let read = self.read_surface();
        if read.start == self.value.start && read.end == self.value.end {
            return;
        }
        self.value.start = read.start;
        self.value.end = read.end;
        self.value.active_formats = None;
        host.selection_changed(read.start, read.end);
        self.apply(true);
    }

    pub fn on_composition_start(&mut self) {
        self.step(Event::CompositionStart);
    }

    pub fn on_composition_end(&mut self, host: &mut dyn SessionHost, now: Instant) {
        if self.step(Event::CompositionEnd) == Action::Sync {
            self.sync(host, now);
        }
    }

    pub fn on_key(&mut self, host: &mut dyn SessionHost, event: KeyEvent) -> KeyOutcome {
        match event.key {
            Key::ArrowLeft | Key::ArrowRight if event.has_modifier() => KeyOutcome::Native,
            Key::ArrowLeft => self.navigate(host, true),
            Key::ArrowRight => self.navigate(host, false),
            Key::Backspace => self.delete(host, true),
            Key::Delete => self.delete(host, false),
            Key::Space => self.indent_at_line_start(host),
            Key::Enter => self.enter(host, event.shift),
        }
    }

    /// Copy a non-collapsed selection.
    pub fn copy(&self) -> Option<ClipboardPayload> {
        let (start, end) = self.value.selection()?;
        if start == end {
            return None;
        }
        let selected = slice(&self.value, start, end);
        Some(ClipboardPayload {
            plain_text: selected.text_content(),
            html: self.serialize(&selected),
            rich_text: true,
        })
    }

    /// Copy a non-collapsed selection, then remove it.
    pub fn cut(&mut self, host: &mut dyn SessionHost) -> Option<ClipboardPayload> {
        let payload = self.copy()?;
        let (start, end) = self.value.selection()?;
        let change = remove(&self.value, start, end);
        self.commit(host, change, false);
        self.checkpoint(host);
        Some(payload)
    }

    pub fn paste(&mut self, host: &mut dyn SessionHost, payload: &ClipboardPayload) {
        let Some((start, end)) = self.value.selection() else {
            log::debug!("paste without a selection ignored");
            return;
        };
        let pasted = if payload.rich_text {
            self.parse(&payload.html)
        } else if let Some(transformed) = host.transform_paste(payload) {
            transformed
        } else if !payload.plain_text.is_empty() {
            Value::from_text(&payload.plain_text)
        } else {
            self.parse(&payload.html)
        };
        let change = insert(&self.value, pasted, start, end);
        self.commit(host, change, false);
        self.checkpoint(host);
    }

    /// Toggle `format` over the selection and announce the result.
    pub fn toggle_format(&mut self, host: &mut dyn SessionHost, format: &Format) -> Toggle {
        let (change, toggle) = toggle_format(&self.value, format);
        if toggle == Toggle::Unchanged {
            return toggle;
        }
        let title = self
            .registry
            .get_format_type(&format.type_name)
            .map_or(format.type_name.as_str(), |format_type| format_type.title.as_str())
            .to_string();
        self.commit(host, change, false);
        self.checkpoint(host);
        match toggle {
            Toggle::Applied => host.announce(&format!("{title} applied.")),
            Toggle::Removed => host.announce(&format!("{title} removed.")),
            Toggle::Unchanged => {}
        }
        toggle
    }

    /// Create the undo level once the debounce deadline has passed.
    pub fn tick(&mut self, host: &mut dyn SessionHost, now: Instant) {
        if self.undo.take_due(now) {
            self.checkpoint(host);
        }
    }

    pub fn teardown(&mut self) {
        self.undo.cancel();
        self.phase = Phase::Idle;
    }

    fn step(&mut self, event: Event) -> Action {
        let (phase, action) = self.phase.next(event);
        self.phase = phase;
        action
    }

    fn sync(&mut self, host: &mut dyn SessionHost, now: Instant) {
        self.process_input(host, None, now);
        self.step(Event::SyncDone);
    }

    fn process_input(&mut self, host: &mut dyn SessionHost, input_type: Option<&str>, now: Instant) {
        if let Some(input_type) = input_type {
            if input_type.starts_with("format") || IGNORED_INPUT_TYPES.contains(&input_type) {
                log::debug!("overwriting native {input_type}");
                self.apply(false);
                return;
            }
        }

        let mut change = self.read_surface();
        let active = self
            .value
            .active_formats
            .clone()
            .unwrap_or_else(|| get_active_formats(&self.value));
        if let (Some(start), Some(end)) = (self.value.start, change.start) {
            update_formats(&mut change, start, end, &active);
        }
        self.commit(host, change, true);
        self.undo.schedule(now);
    }

    /// Walk the pending format count toward the side the caret moves to,
    /// and only move once it matches.
    fn navigate(&mut self, host: &mut dyn SessionHost, reverse: bool) -> KeyOutcome {
        let Some((start, end)) = self.value.selection() else {
            return KeyOutcome::Native;
        };
        if start != end {
            return KeyOutcome::Native;
        }
        let active = get_active_formats(&self.value);
        let len = self.value.len();
        if active.is_empty() && ((start == 0 && reverse) || (end == len && !reverse)) {
            return KeyOutcome::Native;
        }

        let before = start
            .checked_sub(1)
            .and_then(|i| self.value.formats.get(i))
            .cloned()
            .unwrap_or_default();
        let after = self.value.formats.get(start).cloned().unwrap_or_default();
        let source = if before.len() > after.len() { &before } else { &after };

        let mut target = active.len();
        if before.len() < after.len() {
            if !reverse && active.len() < after.len() {
                target += 1;
            }
            if reverse && active.len() > before.len() {
                target -= 1;
            }
        } else if before.len() > after.len() {
            if !reverse && active.len() > after.len() {
                target -= 1;
            }
            if reverse && active.len() < before.len() {
                target += 1;
            }
        }

        if target != active.len() {
            // Pending formats may outnumber either side, so step from them.
            let mut stepped = active.clone();
            if target < active.len() {
                stepped.truncate(target);
            } else {
                stepped.extend(source.iter().find(|f| !active.contains(f)).cloned());
            }
            if stepped.len() != active.len() {
                self.value.active_formats = Some(stepped);
                self.apply(false);
                return KeyOutcome::Handled;
            }
        }

        let moved = if reverse { start.checked_sub(1) } else { Some(start + 1) };
        let Some(position) = moved.filter(|p| *p <= len) else {
            return KeyOutcome::Handled;
        };
        self.value.start = Some(position);
        self.value.end = Some(position);
        self.value.active_formats = Some(if reverse { before } else { after });
        self.apply(false);
        host.selection_changed(Some(position), Some(position));
        KeyOutcome::Handled
    }

    fn delete(&mut self, host: &mut dyn SessionHost, backward: bool) -> KeyOutcome {
        let value = self.read_surface();
        let (Some(start), Some(end)) = (value.start, value.end) else {
            return KeyOutcome::Native;
        };

        if start == 0 && end != 0 && end == value.len() {
            let change = remove(&value, 0, end);
            self.commit(host, change, false);
            self.checkpoint(host);
            return KeyOutcome::Handled;
        }

        if self.settings.multiline_tag.is_some() {
            if let Some(change) = remove_line_separator(&value, backward) {
                self.commit(host, change, false);
                self.checkpoint(host);
                return KeyOutcome::Handled;
            }
        }
        KeyOutcome::Native
    }

    fn indent_at_line_start(&mut self, host: &mut dyn SessionHost) -> KeyOutcome {
        if self.settings.multiline_tag.as_deref() != Some("li") {
            return KeyOutcome::Native;
        }
        let value = self.read_surface();
        let Some(start) = value.start.filter(|_| value.is_collapsed() == Some(true)) else {
            return KeyOutcome::Native;
        };
        let before = start.checked_sub(1).and_then(|i| value.text.chars().nth(i));
        if before.is_some_and(|c| c != LINE_SEPARATOR) {
            return KeyOutcome::Native;
        }

        let root = self.list_root(&value);
        let change = indent_list_items(&value, &root);
        self.commit(host, change, false);
        self.checkpoint(host);
        KeyOutcome::Handled
    }

    /// The outermost list marker in use, else the first wrapper tag.
    fn list_root(&self, value: &Value) -> Format {
        (0..value.len())
            .find_map(|index| value.markers_at(index).first().cloned())
            .unwrap_or_else(|| {
                let tag = self
                    .settings
                    .multiline_wrapper_tags
                    .first()
                    .map_or("ul", String::as_str);
                Format::new(tag)
            })
    }

    fn enter(&mut self, host: &mut dyn SessionHost, shift: bool) -> KeyOutcome {
        let value = self.read_surface();
        let Some((start, end)) = value.selection() else {
            return KeyOutcome::Native;
        };

        let change = if shift {
            insert(&value, "\n", start, end)
        } else if self.settings.multiline_tag.is_some() {
            if value.is_empty_line() {
                let (before, after) = split_at(&value, start, end);
                if host.split(&before, &after) {
                    return KeyOutcome::Handled;
                }
            }
            insert_line_separator(&value, start, end)
        } else {
            let (before, after) = split_at(&value, start, end);
            if host.split(&before, &after) {
                return KeyOutcome::Handled;
            }
            insert(&value, "\n", start, end)
        };
        self.commit(host, change, false);
        self.checkpoint(host);
        KeyOutcome::Handled
    }

    fn commit(&mut self, host: &mut dyn SessionHost, value: Value, dom_only: bool) {
        self.value = value;
        self.apply(dom_only);
        self.markup = self.serialize(&self.value);
        host.value_changed(&self.value, &self.markup);
        host.selection_changed(self.value.start, self.value.end);
    }

    fn checkpoint(&mut self, host: &mut dyn SessionHost) {
        if self.markup == self.last_checkpoint {
            return;
        }
        host.create_undo_level();
        self.last_checkpoint = self.markup.clone();
    }

    fn apply(&mut self, dom_only: bool) {
        let root = self.surface.root();
        surface::apply(
            &self.value,
            &mut self.surface,
            root,
            &self.settings.tree_options(),
            &self.registry,
            &mut self.scratch,
            dom_only,
        );
    }

    fn serialize(&self, value: &Value) -> String {
        to_html_string(value, self.settings.multiline_tag.as_deref(), &self.registry)
    }

    fn parse(&self, markup: &str) -> Value {
        create_from_markup(markup, &self.settings.create_options(false), &self.registry)
    }
}
