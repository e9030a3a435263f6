//! Interaction tools: the global registry, the tool group bound to the viewport
//! and the two mutually exclusive tool families.

pub mod annotation;
pub mod interaction;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ToolError;

pub const TOOLGROUP_ID: &str = "stackviewToolGroup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    WindowLevel,
    Pan,
    Zoom,
    StackScroll,
    Length,
    RectangleRoi,
    EllipticalRoi,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::WindowLevel,
        ToolKind::Pan,
        ToolKind::Zoom,
        ToolKind::StackScroll,
        ToolKind::Length,
        ToolKind::RectangleRoi,
        ToolKind::EllipticalRoi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::WindowLevel => "WindowLevel",
            ToolKind::Pan => "Pan",
            ToolKind::Zoom => "Zoom",
            ToolKind::StackScroll => "StackScroll",
            ToolKind::Length => "Length",
            ToolKind::RectangleRoi => "RectangleROI",
            ToolKind::EllipticalRoi => "EllipticalROI",
        }
    }

    pub fn family(self) -> Option<ToolFamily> {
        match self {
            ToolKind::WindowLevel | ToolKind::Pan | ToolKind::Zoom => Some(ToolFamily::Navigation),
            ToolKind::Length | ToolKind::RectangleRoi | ToolKind::EllipticalRoi => {
                Some(ToolFamily::Annotation)
            }
            ToolKind::StackScroll => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFamily {
    Navigation,
    Annotation,
}

impl ToolFamily {
    pub fn members(self) -> impl Iterator<Item = ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(move |kind| kind.family() == Some(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTool {
    WindowLevel,
    Pan,
    Zoom,
}

impl NavigationTool {
    pub const ALL: [NavigationTool; 3] = [
        NavigationTool::WindowLevel,
        NavigationTool::Pan,
        NavigationTool::Zoom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NavigationTool::WindowLevel => "W/L",
            NavigationTool::Pan => "Pan",
            NavigationTool::Zoom => "Zoom",
        }
    }
}

impl From<NavigationTool> for ToolKind {
    fn from(tool: NavigationTool) -> Self {
        match tool {
            NavigationTool::WindowLevel => ToolKind::WindowLevel,
            NavigationTool::Pan => ToolKind::Pan,
            NavigationTool::Zoom => ToolKind::Zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTool {
    Length,
    Rectangle,
    Ellipse,
}

impl AnnotationTool {
    pub const ALL: [AnnotationTool; 3] = [
        AnnotationTool::Length,
        AnnotationTool::Rectangle,
        AnnotationTool::Ellipse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnnotationTool::Length => "Length",
            AnnotationTool::Rectangle => "Rectangle",
            AnnotationTool::Ellipse => "Ellipse",
        }
    }

    pub fn from_kind(kind: ToolKind) -> Option<Self> {
        match kind {
            ToolKind::Length => Some(AnnotationTool::Length),
            ToolKind::RectangleRoi => Some(AnnotationTool::Rectangle),
            ToolKind::EllipticalRoi => Some(AnnotationTool::Ellipse),
            _ => None,
        }
    }
}

impl From<AnnotationTool> for ToolKind {
    fn from(tool: AnnotationTool) -> Self {
        match tool {
            AnnotationTool::Length => ToolKind::Length,
            AnnotationTool::Rectangle => ToolKind::RectangleRoi,
            AnnotationTool::Ellipse => ToolKind::EllipticalRoi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseBinding {
    Primary,
    Secondary,
    Auxiliary,
    Wheel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Disabled,
    Passive,
    Active(Vec<MouseBinding>),
}

impl ToolMode {
    pub fn is_active(&self) -> bool {
        matches!(self, ToolMode::Active(_))
    }
}

/// Tools known to the process, independent of any group.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    registered: BTreeSet<ToolKind>,
}

impl ToolRegistry {
    pub fn add_tool(&mut self, kind: ToolKind) -> Result<(), ToolError> {
        if self.registered.insert(kind) {
            Ok(())
        } else {
            Err(ToolError::AlreadyRegistered(kind))
        }
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.registered.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct ToolEntry {
    mode: ToolMode,
    activated_at: u64,
}

#[derive(Debug)]
pub struct ToolGroup {
    id: String,
    tools: BTreeMap<ToolKind, ToolEntry>,
    viewports: Vec<(String, String)>,
    activation_counter: u64,
}

impl ToolGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tools: BTreeMap::new(),
            viewports: Vec::new(),
            activation_counter: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_tool(&mut self, registry: &ToolRegistry, kind: ToolKind) -> Result<(), ToolError> {
        if !registry.contains(kind) {
            return Err(ToolError::NotRegistered(kind));
        }
        self.tools.entry(kind).or_default();
        Ok(())
    }

    pub fn add_viewport(&mut self, viewport_id: &str, engine_id: &str) {
        let binding = (viewport_id.to_string(), engine_id.to_string());
        if !self.viewports.contains(&binding) {
            self.viewports.push(binding);
        }
    }

    pub fn viewports(&self) -> &[(String, String)] {
        &self.viewports
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn set_tool_active(
        &mut self,
        kind: ToolKind,
        bindings: &[MouseBinding],
    ) -> Result<(), ToolError> {
        self.activation_counter += 1;
        let sequence = self.activation_counter;
        let entry = self.entry_mut(kind)?;
        entry.mode = ToolMode::Active(bindings.to_vec());
        entry.activated_at = sequence;
        log::debug!("{kind} active on {bindings:?}");
        Ok(())
    }

    /// Passivating a tool that is not active leaves it untouched.
    pub fn set_tool_passive(&mut self, kind: ToolKind) -> Result<(), ToolError> {
        let entry = self.entry_mut(kind)?;
        if entry.mode.is_active() {
            entry.mode = ToolMode::Passive;
            log::debug!("{kind} passive");
        }
        Ok(())
    }

    pub fn mode(&self, kind: ToolKind) -> Option<&ToolMode> {
        self.tools.get(&kind).map(|entry| &entry.mode)
    }

    pub fn is_active(&self, kind: ToolKind) -> bool {
        self.mode(kind).is_some_and(ToolMode::is_active)
    }

    pub fn active_tools(&self) -> impl Iterator<Item = ToolKind> + '_ {
        self.tools
            .iter()
            .filter(|(_, entry)| entry.mode.is_active())
            .map(|(kind, _)| *kind)
    }

    /// The tool answering `binding`; when several active tools share it the
    /// most recently activated one wins.
    pub fn active_tool_for(&self, binding: MouseBinding) -> Option<ToolKind> {
        self.tools
            .iter()
            .filter_map(|(kind, entry)| match &entry.mode {
                ToolMode::Active(bindings) if bindings.contains(&binding) => {
                    Some((entry.activated_at, *kind))
                }
                _ => None,
            })
            .max_by_key(|(activated_at, _)| *activated_at)
            .map(|(_, kind)| kind)
    }

    fn entry_mut(&mut self, kind: ToolKind) -> Result<&mut ToolEntry, ToolError> {
        let group = self.id.clone();
        self.tools
            .get_mut(&kind)
            .ok_or(ToolError::NotInGroup(kind, group))
    }
}

/// Registers every tool globally and wires a fresh group to the viewport.
/// Repeated registration is tolerated.
pub fn register_tools(
    registry: &mut ToolRegistry,
    viewport_id: &str,
    engine_id: &str,
) -> Result<ToolGroup, ToolError> {
    for kind in ToolKind::ALL {
        if let Err(err) = registry.add_tool(kind) {
            log::debug!("{err}");
        }
    }

    let mut group = ToolGroup::new(TOOLGROUP_ID);
    for kind in ToolKind::ALL {
        group.add_tool(registry, kind)?;
    }
    group.add_viewport(viewport_id, engine_id);

    group.set_tool_active(ToolKind::WindowLevel, &[MouseBinding::Primary])?;
    group.set_tool_active(ToolKind::StackScroll, &[MouseBinding::Wheel])?;
    for kind in ToolFamily::Annotation.members() {
        group.tools.entry(kind).or_default().mode = ToolMode::Passive;
    }

    log::info!(
        "Registered {} tools in group `{}`",
        group.tool_count(),
        group.id()
    );
    Ok(group)
}

pub fn select_navigation_tool(group: &mut ToolGroup, tool: NavigationTool) -> Result<(), ToolError> {
    select_in_family(group, ToolFamily::Navigation, tool.into())
}

pub fn select_drawing_tool(group: &mut ToolGroup, tool: AnnotationTool) -> Result<(), ToolError> {
    select_in_family(group, ToolFamily::Annotation, tool.into())
}

fn select_in_family(
    group: &mut ToolGroup,
    family: ToolFamily,
    selected: ToolKind,
) -> Result<(), ToolError> {
    for kind in family.members().filter(|kind| *kind != selected) {
        if let Err(err) = group.set_tool_passive(kind) {
            log::warn!("Ignoring failure to passivate {kind}: {err}");
        }
    }
    group.set_tool_active(selected, &[MouseBinding::Primary])
}
