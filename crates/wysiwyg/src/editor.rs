use std::collections::HashMap;

use manos_dom_core::mutate::{self, NodeFactory};
use manos_dom_core::{
    Dom, ElementFactory, NodeId, Range, Selection, SelectionManager, Style, StyleOptions,
    inner_html, parse_html_into, parse_marked, set_css, to_marked, walk,
};
use serde_json::Value;

use crate::config::EditorConfig;
use crate::error::{CommandError, EditorError};
use crate::observer::{EditorEvent, Observer};
use crate::plugin::{CommandSpec, PluginRegistry};

/// A rich-text editor bound to a host element of a [`Dom`].
///
/// The host is hidden and a container holding the editable area is inserted
/// right after it. The area's HTML is written back to the host on every
/// [`Editor::sync`].
pub struct Editor {
    dom: Dom,
    host: NodeId,
    host_style: Option<String>,
    container: NodeId,
    area: NodeId,
    selection: Selection,
    config: EditorConfig,
    commands: HashMap<String, CommandSpec>,
    events: Observer,
    read_only: bool,
    synced: String,
}

impl Editor {
    pub fn new(
        mut dom: Dom,
        host: NodeId,
        config: EditorConfig,
        registry: &PluginRegistry,
    ) -> Result<Self, EditorError> {
        let config = config.with_defaults();
        config.validate()?;
        if dom.element(host).is_none() {
            return Err(EditorError::HostNotElement);
        }
        if dom.parent(host).is_none() {
            return Err(EditorError::HostDetached);
        }
        let commands = registry.load(&config.plugins)?;

        let initial = if is_textarea(&dom, host) {
            dom.text_content(host)
        } else {
            inner_html(&dom, host)
        };
        let host_style = dom.attr(host, "style").map(str::to_string);
        set_css(&mut dom, host, "display", Some("none"));

        let factory = NodeFactory::for_node(&dom, host);
        let container = factory.element(&mut dom, "div");
        dom.set_attr(container, "class", "manos manos-container");
        let area = factory.element(&mut dom, "div");
        dom.set_attr(area, "class", "manos-editor");
        dom.set_attr(area, "contenteditable", "true");
        dom.append_child(container, area);
        mutate::after(&mut dom, host, container);
        parse_html_into(&mut dom, area, &initial);

        let synced = inner_html(&dom, area);
        let mut editor = Self {
            dom,
            host,
            host_style,
            container,
            area,
            selection: Selection::new(area),
            read_only: false,
            config,
            commands,
            events: Observer::new(),
            synced,
        };
        if editor.config.read_only {
            editor.set_read_only(true);
        }
        tracing::debug!(commands = editor.commands.len(), "editor bound to host");
        Ok(editor)
    }

    /// An editor over a fresh document whose `textarea` holds `value`, with
    /// every builtin plugin.
    pub fn with_builtin_plugins(value: &str) -> Self {
        let (dom, host) = textarea_page(value);
        Self::new(
            dom,
            host,
            EditorConfig::default(),
            &PluginRegistry::builtin(),
        )
        .expect("builtin editor must be valid")
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn area(&self) -> NodeId {
        self.area
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, range: Option<Range>) {
        self.selection.set_range(range);
    }

    pub fn events(&mut self) -> &mut Observer {
        &mut self.events
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Gives a command handler simultaneous access to the tree and the
    /// selection.
    pub fn parts_mut(&mut self) -> (&mut Dom, &mut Selection) {
        (&mut self.dom, &mut self.selection)
    }

    /// HTML of the editable area.
    pub fn value(&self) -> String {
        inner_html(&self.dom, self.area)
    }

    pub fn set_value(&mut self, html: &str) {
        mutate::detach(&mut self.dom, self.area);
        parse_html_into(&mut self.dom, self.area, html);
        self.selection.set_range(None);
        self.sync();
    }

    /// Replaces the area's content with marked HTML and takes its selection.
    pub fn set_marked(&mut self, marked: &str) {
        mutate::detach(&mut self.dom, self.area);
        let parsed = parse_marked(&mut self.dom, self.area, marked);
        self.selection.set_range(parsed.range());
        self.sync();
    }

    /// The area's HTML with the current selection written into it.
    pub fn marked(&self) -> String {
        to_marked(&self.dom, &self.selection)
    }

    /// Writes the area's HTML back to the host and fires `Change` when it
    /// differs from the last synced value.
    pub fn sync(&mut self) {
        let value = self.value();
        if value == self.synced {
            return;
        }

        mutate::detach(&mut self.dom, self.host);
        if is_textarea(&self.dom, self.host) {
            let text = NodeFactory::for_node(&self.dom, self.host).text(&mut self.dom, value.clone());
            self.dom.append_child(self.host, text);
        } else {
            parse_html_into(&mut self.dom, self.host, &value);
        }

        let old = std::mem::replace(&mut self.synced, value.clone());
        tracing::debug!(len = value.len(), "source synchronized");
        self.events.fire(&EditorEvent::Change { old, new: value });
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.dom
            .set_attr(self.area, "contenteditable", if read_only { "false" } else { "true" });
        self.events.changed("read_only", &Value::Bool(read_only));
    }

    /// Unbinds the editor: syncs a last time, removes the container and shows
    /// the host again. Returns the document.
    pub fn destruct(mut self) -> Dom {
        self.sync();
        self.events.fire(&EditorEvent::Destruct);
        self.events.clear();

        mutate::safe_remove(&mut self.dom, self.container);
        match self.host_style.take() {
            Some(style) => self.dom.set_attr(self.host, "style", style),
            None => {
                self.dom.remove_attr(self.host, "style");
            }
        }
        tracing::debug!("editor destructed");
        self.dom
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), EditorError> {
        if self.read_only {
            return Err(EditorError::ReadOnly);
        }
        let command = self.command(id)?;

        self.events.fire(&EditorEvent::BeforeCommand {
            command: command.id.clone(),
        });
        tracing::debug!(command = %command.id, ?args, "running command");
        (command.handler)(self, args)?;
        self.sync();
        self.events.fire(&EditorEvent::AfterCommand { command: command.id });
        Ok(())
    }

    /// Whether the start of the selection sits inside an element that already
    /// carries the command's style.
    pub fn is_active(&self, id: &str) -> Result<bool, EditorError> {
        let command = self.command(id)?;
        let (Some(options), Some(range)) = (command.style.as_ref(), self.selection.range()) else {
            return Ok(false);
        };
        let style = Style::new(self.style_for(id, options));
        Ok(walk::up(
            &self.dom,
            range.start.node,
            |dom, node| style.is_suitable_element(dom, node, false),
            self.area,
        )
        .is_some())
    }

    /// `defaults` with the configured overrides for `command` laid over them.
    pub fn style_for(&self, command: &str, defaults: &StyleOptions) -> StyleOptions {
        let Some(control) = self.config.controls.get(command) else {
            return defaults.clone();
        };
        let mut options = defaults.clone();
        if control.element.is_some() {
            options.element = control.element.clone();
        }
        if control.default_tag.is_some() {
            options.default_tag = control.default_tag.clone();
        }
        if let Some(style) = &control.style {
            options
                .style
                .get_or_insert_with(Default::default)
                .extend(style.clone());
        }
        options
    }

    /// Applies `style` over the selection, placing a caret at the end of the
    /// area first when there is no selection.
    pub fn apply_style(&mut self, style: &Style) {
        if self.selection.range().is_none() {
            self.selection.set_cursor_in(&self.dom, self.area, false);
        }
        style.apply(&mut self.dom, &mut self.selection);
    }

    fn command(&self, id: &str) -> Result<CommandSpec, CommandError> {
        self.commands
            .get(id)
            .cloned()
            .ok_or_else(|| CommandError::Unknown(id.to_string()))
    }
}

fn is_textarea(dom: &Dom, node: NodeId) -> bool {
    dom.tag(node) == Some("textarea")
}

/// A document with a `body` holding one `textarea` whose text is `value`.
pub fn textarea_page(value: &str) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let realm = dom.realm(doc);
    let body = dom.create_element(realm, "body");
    let textarea = dom.create_element(realm, "textarea");
    let text = dom.create_text(realm, value);
    dom.append_child(doc, body);
    dom.append_child(body, textarea);
    dom.append_child(textarea, text);
    (dom, textarea)
}
