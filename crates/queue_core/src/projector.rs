//! Presentation surface: named templates rendered into named regions.
//!
//! Per-entity rows are tagged with an [`EntityRef`] and indexed so they can be
//! found and removed without walking the surface. Singleton panels use
//! [`ProjectionMode::Replace`]; rows use [`ProjectionMode::Append`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use shared::{
    domain::{RequestId, UserId},
    protocol::{Instructor, Request},
};

use crate::error::SyncError;

pub mod template {
    pub const REQUEST: &str = "request";
    pub const HELP_REQUEST_FORM: &str = "help_request_form";
    pub const INSTRUCTOR_FORM: &str = "instructor_form";
    pub const MY_REQUEST: &str = "my-request";
    pub const INSTRUCTOR: &str = "instructor";
    pub const EMPTY: &str = "empty";
    pub const MESSAGE: &str = "message";

    pub const REQUIRED: [&str; 7] = [
        REQUEST,
        HELP_REQUEST_FORM,
        INSTRUCTOR_FORM,
        MY_REQUEST,
        INSTRUCTOR,
        EMPTY,
        MESSAGE,
    ];
}

pub mod region {
    pub const REQUESTS: &str = "requests";
    pub const REQUESTS_COUNT: &str = "requests-count";
    pub const ACTION_CONTENT: &str = "action-content";
    pub const INSTRUCTORS: &str = "instructors";
    pub const MESSAGES: &str = "messages";

    pub const REQUIRED: [&str; 5] = [REQUESTS, REQUESTS_COUNT, ACTION_CONTENT, INSTRUCTORS, MESSAGES];
}

/// Section flag kept only for instructor viewers.
pub const INSTRUCTOR_FLAG: &str = "instructor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Append,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Request,
    Instructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Request(RequestId),
    Instructor(UserId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Request(_) => EntityKind::Request,
            EntityRef::Instructor(_) => EntityKind::Instructor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Data a template is rendered with, plus the tags the rendered node carries.
#[derive(Debug, Clone)]
pub struct Binding {
    entity: Option<EntityRef>,
    requester_id: Option<UserId>,
    countable: bool,
    fields: BTreeMap<String, String>,
    flags: BTreeSet<String>,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            entity: None,
            requester_id: None,
            countable: true,
            fields: BTreeMap::new(),
            flags: BTreeSet::new(),
        }
    }
}

impl Binding {
    pub fn none() -> Self {
        Self::default()
    }

    /// Rows such as the empty-list placeholder that must never be counted.
    pub fn placeholder() -> Self {
        Self {
            countable: false,
            ..Self::default()
        }
    }

    pub fn request(request: &Request) -> Self {
        let mut binding = Self {
            entity: Some(EntityRef::Request(request.id)),
            requester_id: Some(request.requester_id),
            ..Self::default()
        };
        binding
            .set("id", request.id.to_string())
            .set("requester.name", request.requester.name.clone())
            .set("requester.email", request.requester.email.clone())
            .set("requester.avatar_url", request.requester.avatar_url.clone())
            .set("location", request.location.clone())
            .set("description", request.description.clone())
            .set("created_at", request.created_at.to_rfc3339());
        binding
    }

    /// The viewer's editable request panel. Not entity-tagged: it is a singleton.
    pub fn my_request(request: &Request) -> Self {
        let mut binding = Self::default();
        binding
            .set("id", request.id.to_string())
            .set("location", request.location.clone())
            .set("description", request.description.clone());
        binding
    }

    pub fn instructor(instructor: &Instructor) -> Self {
        let mut binding = Self {
            entity: Some(EntityRef::Instructor(instructor.id)),
            ..Self::default()
        };
        binding
            .set("id", instructor.id.to_string())
            .set("name", instructor.name.clone())
            .set("avatar_url", instructor.avatar_url.clone());
        binding
    }

    pub fn message(header: &str, text: &str) -> Self {
        let mut binding = Self::default();
        binding.set("header", header).set("text", text);
        binding
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn with_flag(mut self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.flags.insert(flag.to_string());
        } else {
            self.flags.remove(flag);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNode {
    /// `None` for plain text set via [`Surface::set_text`].
    pub template: Option<String>,
    pub entity: Option<EntityRef>,
    pub requester_id: Option<UserId>,
    pub countable: bool,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceToggle {
    pub online: bool,
}

impl PresenceToggle {
    /// The toggle offers the opposite of the current state.
    pub fn label(&self) -> &'static str {
        if self.online {
            "Go Offline"
        } else {
            "Go Online"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Controls {
    pub queue_pop_enabled: bool,
    pub presence_toggle: Option<PresenceToggle>,
    pub loading: bool,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct TemplateSet {
    bodies: HashMap<String, String>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    pub fn empty() -> Self {
        Self {
            bodies: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::empty()
            .with_template(
                template::REQUEST,
                "#{{id}} {{requester.name}} <{{requester.email}}> at {{location}} ({{created_at}}): {{description}}{{#instructor}} [resolve]{{/instructor}}",
            )
            .with_template(
                template::HELP_REQUEST_FORM,
                "Need help? Submit a request with your location and a description.",
            )
            .with_template(
                template::INSTRUCTOR_FORM,
                "Instructor controls: pop the queue or change your status.",
            )
            .with_template(
                template::MY_REQUEST,
                "Your request #{{id}} at {{location}}: {{description}}",
            )
            .with_template(template::INSTRUCTOR, "{{name}} <{{avatar_url}}>")
            .with_template(template::EMPTY, "No outstanding requests.")
            .with_template(template::MESSAGE, "{{header}}: {{text}}")
    }

    /// Built-in bodies overlaid with a `[templates]` table.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        let file: TemplateFile = toml::from_str(raw)?;
        let mut set = Self::builtin();
        set.bodies.extend(file.templates);
        Ok(set)
    }

    pub fn with_template(mut self, name: &str, body: impl Into<String>) -> Self {
        self.bodies.insert(name.to_string(), body.into());
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.bodies.remove(name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    pub fn render(&self, name: &str, binding: &Binding) -> Result<String, SyncError> {
        let body = self
            .bodies
            .get(name)
            .ok_or_else(|| SyncError::missing_template(name))?;
        Ok(render_body(body, binding))
    }
}

fn render_body(body: &str, binding: &Binding) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let tag = after[..end].trim();
        rest = &after[end + 2..];

        if let Some(section) = tag.strip_prefix('#') {
            let close = format!("{{{{/{section}}}}}");
            let (inner, tail) = match rest.find(&close) {
                Some(at) => (&rest[..at], &rest[at + close.len()..]),
                None => (rest, ""),
            };
            if binding.flags.contains(section) {
                out.push_str(&render_body(inner, binding));
            }
            rest = tail;
        } else if !tag.starts_with('/') {
            if let Some(value) = binding.fields.get(tag) {
                out.push_str(value);
            }
        }
    }

    out.push_str(rest);
    out
}

/// Comparable, handle-free view of everything the surface shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub regions: BTreeMap<String, Vec<RenderedNode>>,
    pub controls: Controls,
}

pub struct Surface {
    templates: TemplateSet,
    regions: BTreeMap<String, Vec<NodeId>>,
    nodes: HashMap<NodeId, RenderedNode>,
    index: HashMap<EntityRef, (String, NodeId)>,
    controls: Controls,
    next_node: u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(TemplateSet::builtin())
    }
}

impl Surface {
    /// A surface carrying every region the engine renders into.
    pub fn new(templates: TemplateSet) -> Self {
        Self::with_regions(templates, &region::REQUIRED)
    }

    pub fn with_regions(templates: TemplateSet, regions: &[&str]) -> Self {
        Self {
            templates,
            regions: regions
                .iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
            nodes: HashMap::new(),
            index: HashMap::new(),
            controls: Controls::default(),
            next_node: 0,
        }
    }

    /// Checks that every template and region the engine uses is present.
    pub fn validate(&self) -> Result<(), SyncError> {
        if let Some(name) = template::REQUIRED
            .iter()
            .find(|name| !self.templates.contains(name))
        {
            return Err(SyncError::missing_template(*name));
        }
        if let Some(name) = region::REQUIRED
            .iter()
            .find(|name| !self.regions.contains_key(**name))
        {
            return Err(SyncError::missing_region(*name));
        }
        Ok(())
    }

    /// Renders `template_name` into `region_name`. An entity that already has
    /// a rendered node is re-rendered in place regardless of `mode`.
    pub fn project(
        &mut self,
        template_name: &str,
        region_name: &str,
        mode: ProjectionMode,
        binding: Binding,
    ) -> Result<NodeId, SyncError> {
        let content = self.templates.render(template_name, &binding)?;
        if !self.regions.contains_key(region_name) {
            return Err(SyncError::missing_region(region_name));
        }

        let node = RenderedNode {
            template: Some(template_name.to_string()),
            entity: binding.entity,
            requester_id: binding.requester_id,
            countable: binding.countable,
            content,
        };

        if let Some(entity) = node.entity {
            if let Some((_, existing)) = self.index.get(&entity) {
                let existing = *existing;
                self.nodes.insert(existing, node);
                return Ok(existing);
            }
        }

        if mode == ProjectionMode::Replace {
            self.clear_region(region_name);
        }
        Ok(self.attach(region_name, node))
    }

    /// Replaces the region's contents with a bare text node.
    pub fn set_text(&mut self, region_name: &str, text: impl Into<String>) -> Result<(), SyncError> {
        if !self.regions.contains_key(region_name) {
            return Err(SyncError::missing_region(region_name));
        }
        self.clear_region(region_name);
        self.attach(
            region_name,
            RenderedNode {
                template: None,
                entity: None,
                requester_id: None,
                countable: false,
                content: text.into(),
            },
        );
        Ok(())
    }

    pub fn find_by_id(&self, entity: EntityRef) -> Option<&RenderedNode> {
        let (_, node_id) = self.index.get(&entity)?;
        self.nodes.get(node_id)
    }

    pub fn delete_by_id(&mut self, entity: EntityRef) -> Option<RenderedNode> {
        let (region_name, node_id) = self.index.remove(&entity)?;
        if let Some(region_nodes) = self.regions.get_mut(&region_name) {
            region_nodes.retain(|id| *id != node_id);
        }
        self.nodes.remove(&node_id)
    }

    pub fn region_nodes(&self, region_name: &str) -> Vec<&RenderedNode> {
        self.regions
            .get(region_name)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn region_text(&self, region_name: &str) -> String {
        self.region_nodes(region_name)
            .iter()
            .map(|node| node.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn countable_rows(&self, region_name: &str) -> usize {
        self.region_nodes(region_name)
            .iter()
            .filter(|node| node.countable)
            .count()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn toggle_queue_pop(&mut self, enabled: bool) {
        self.controls.queue_pop_enabled = enabled;
    }

    pub fn set_instructor_status(&mut self, online: bool) {
        self.controls.presence_toggle = Some(PresenceToggle { online });
    }

    pub fn disable_page(&mut self) {
        self.controls.loading = true;
    }

    pub fn enable_page(&mut self) {
        self.controls.loading = false;
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            regions: self
                .regions
                .keys()
                .map(|name| {
                    let nodes = self.region_nodes(name).into_iter().cloned().collect();
                    (name.clone(), nodes)
                })
                .collect(),
            controls: self.controls.clone(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for name in region::REQUIRED {
            out.push_str(&format!("[{name}]\n"));
            for node in self.region_nodes(name) {
                out.push_str(&format!("  {}\n", node.content));
            }
        }
        out.push_str(&format!(
            "[controls] pop={} loading={}",
            if self.controls.queue_pop_enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.controls.loading
        ));
        if let Some(toggle) = self.controls.presence_toggle {
            out.push_str(&format!(" toggle=\"{}\"", toggle.label()));
        }
        out.push('\n');
        out
    }

    fn attach(&mut self, region_name: &str, node: RenderedNode) -> NodeId {
        let node_id = NodeId(self.next_node);
        self.next_node += 1;
        if let Some(entity) = node.entity {
            self.index
                .insert(entity, (region_name.to_string(), node_id));
        }
        self.nodes.insert(node_id, node);
        if let Some(region_nodes) = self.regions.get_mut(region_name) {
            region_nodes.push(node_id);
        }
        node_id
    }

    fn clear_region(&mut self, region_name: &str) {
        let Some(region_nodes) = self.regions.get_mut(region_name) else {
            return;
        };
        for node_id in std::mem::take(region_nodes) {
            if let Some(node) = self.nodes.remove(&node_id) {
                if let Some(entity) = node.entity {
                    self.index.remove(&entity);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/projector_tests.rs"]
mod tests;
