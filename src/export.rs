//! Serializes generated tracks into a Shotcut-editable MLT project.

use std::fmt::Write as _;

use crate::durations::Frames;
use crate::schema::VideoMode;
use crate::timeline::{Clip, Filter, Source, Track};

/// Turns a finished stack of tracks (top track first) into bytes on disk.
pub trait Exporter {
    fn compose(&self, tracks: &[Track]) -> Document;
    fn serialize(&self, document: &Document) -> Vec<u8>;
}

/// A minimal XML tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search over this element and every descendant.
    pub fn descendants<'e>(&'e self, name: &'e str) -> Vec<&'e Element> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            if element.name == name {
                found.push(element);
            }
            let mut children: Vec<&Element> = element.elements().collect();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// The text of a `<property name="...">` child.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.elements()
            .find(|child| child.name == "property" && child.attribute("name") == Some(name))
            .and_then(|property| {
                property.children.iter().find_map(|node| match node {
                    Node::Text(text) => Some(text.as_str()),
                    Node::Element(_) => None,
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}<{}", element.name);
    for (key, value) in &element.attributes {
        let _ = write!(out, " {key}=\"{}\"", escape(value));
    }

    match element.children.as_slice() {
        [] => out.push_str("/>\n"),
        [Node::Text(text)] => {
            let _ = writeln!(out, ">{}</{}>", escape(text), element.name);
        }
        children => {
            out.push_str(">\n");
            for child in children {
                match child {
                    Node::Element(child) => write_element(out, child, depth + 1),
                    Node::Text(text) => {
                        let _ = writeln!(out, "{indent}  {}", escape(text));
                    }
                }
            }
            let _ = writeln!(out, "{indent}</{}>", element.name);
        }
    }
}

fn property(name: &str, value: impl ToString) -> Element {
    Element::new("property").attr("name", name).text(value.to_string())
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Shotcut only recognizes its own filter panels when these hints are present.
fn shotcut_tags(filter: &Filter) -> Vec<(&'static str, String)> {
    match filter.service.as_str() {
        "dynamictext" => {
            let size = filter.property("size").unwrap_or_default().to_owned();
            vec![
                ("shotcut:filter", "dynamicText".to_owned()),
                ("shotcut:usePointSize", "1".to_owned()),
                ("shotcut:pointSize", size),
            ]
        }
        "qtext" => vec![("shotcut:filter", "richText".to_owned())],
        "mask_start" => vec![("shotcut:filter", "maskFromFile".to_owned())],
        "affine" => vec![("shotcut:filter", "affineSizePosition".to_owned())],
        "brightness" => filter
            .property("alpha")
            .and_then(fade_tags)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `a=0;b=1` is a fade in over `b - a` frames, `a=1;b=0` a fade out.
fn fade_tags(alpha: &str) -> Option<Vec<(&'static str, String)>> {
    let mut keyframes = alpha.split(';').map(|keyframe| {
        let (frame, value) = keyframe.split_once('=')?;
        Some((frame.trim().parse::<Frames>().ok()?, value.trim()))
    });
    let (start, from) = keyframes.next()??;
    let (end, to) = keyframes.next()??;
    if keyframes.next().is_some() {
        return None;
    }

    let length = (end - start).to_string();
    match (from, to) {
        ("0", "1") => Some(vec![
            ("shotcut:filter", "fadeInBrightness".to_owned()),
            ("shotcut:animIn", length),
        ]),
        ("1", "0") => Some(vec![
            ("shotcut:filter", "fadeOutBrightness".to_owned()),
            ("shotcut:animOut", length),
        ]),
        _ => None,
    }
}

/// Writes MLT XML for Shotcut: one playlist per track over a solid background.
#[derive(Debug, Clone)]
pub struct MltExporter {
    pub video_mode: VideoMode,
    pub background: String,
}

impl MltExporter {
    pub fn new(video_mode: VideoMode, background: impl Into<String>) -> Self {
        Self {
            video_mode,
            background: background.into(),
        }
    }

    fn profile(&self) -> Element {
        let VideoMode { width, height, fps } = self.video_mode;
        let divisor = gcd(width, height).max(1);
        Element::new("profile")
            .attr("description", format!("{height}p {fps} fps"))
            .attr("width", width)
            .attr("height", height)
            .attr("progressive", 1)
            .attr("sample_aspect_num", 1)
            .attr("sample_aspect_den", 1)
            .attr("display_aspect_num", width / divisor)
            .attr("display_aspect_den", height / divisor)
            .attr("frame_rate_num", fps)
            .attr("frame_rate_den", 1)
            .attr("colorspace", 709)
    }

    fn filter_element(filter: &Filter, id: String, out: Frames) -> Element {
        let mut element = Element::new("filter").attr("id", id);
        if filter.service == "affine" {
            element = element.attr("out", out);
        }
        element.push(property("mlt_service", &filter.service));
        for (key, value) in &filter.properties {
            element.push(property(key, value));
        }
        for (key, value) in shotcut_tags(filter) {
            element.push(property(key, value));
        }
        element
    }

    fn producer(resource: &str, id: &str, out: Frames) -> Element {
        let mut producer = Element::new("producer")
            .attr("id", id)
            .attr("in", 0)
            .attr("out", out)
            .child(property("resource", resource));
        if resource.starts_with("color:") {
            producer.push(property("mlt_service", "color"));
        }
        producer
    }
}

struct Ids {
    producers: usize,
    filters: usize,
}

impl Ids {
    fn producer(&mut self) -> String {
        self.producers += 1;
        format!("producer{}", self.producers)
    }

    fn filter(&mut self) -> String {
        self.filters += 1;
        format!("filter{}", self.filters)
    }
}

impl Exporter for MltExporter {
    fn compose(&self, tracks: &[Track]) -> Document {
        let total = tracks.iter().map(Track::length).max().unwrap_or(0).max(1);
        let last_frame = total - 1;

        let mut root = Element::new("mlt")
            .attr("LC_NUMERIC", "C")
            .attr("version", "7.0.0")
            .attr("root", "")
            .child(self.profile());

        root.push(Self::producer(
            &format!("color:{}", self.background),
            "background",
            last_frame,
        ));
        root.push(
            Element::new("playlist").attr("id", "background_track").child(
                Element::new("entry")
                    .attr("producer", "background")
                    .attr("in", 0)
                    .attr("out", last_frame),
            ),
        );

        let mut tractor = Element::new("tractor")
            .attr("id", "tractor0")
            .attr("in", 0)
            .attr("out", last_frame)
            .child(property("shotcut", 1))
            .child(Element::new("track").attr("producer", "background_track"));

        let mut ids = Ids {
            producers: 0,
            filters: 0,
        };

        // MLT stacks later tracks on top.
        for (index, track) in tracks.iter().rev().enumerate() {
            let playlist_id = format!("playlist{index}");
            let mut playlist = Element::new("playlist")
                .attr("id", &playlist_id)
                .child(property("shotcut:name", &track.name));

            for clip in &track.clips {
                playlist.push(self.clip_entry(clip, &mut ids, &mut root));
            }

            root.push(playlist);
            tractor.push(Element::new("track").attr("producer", playlist_id));
        }

        for b_track in 1..=tracks.len() {
            tractor.push(
                Element::new("transition")
                    .attr("id", format!("composite{b_track}"))
                    .child(property("a_track", 0))
                    .child(property("b_track", b_track))
                    .child(property("mlt_service", "composite"))
                    .child(property("distort", 0)),
            );
            tractor.push(
                Element::new("transition")
                    .attr("id", format!("mix{b_track}"))
                    .child(property("a_track", 0))
                    .child(property("b_track", b_track))
                    .child(property("mlt_service", "mix"))
                    .child(property("always_active", 1))
                    .child(property("sum", 1)),
            );
        }

        root.push(tractor);
        Document { root }
    }

    fn serialize(&self, document: &Document) -> Vec<u8> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        write_element(&mut out, &document.root, 0);
        out.into_bytes()
    }
}

impl MltExporter {
    /// Pushes the clip's producer onto `root` and returns the playlist entry pointing at it.
    fn clip_entry(&self, clip: &Clip, ids: &mut Ids, root: &mut Element) -> Element {
        let resource = match &clip.source {
            Source::Blank => return Element::new("blank").attr("length", clip.length()),
            Source::Resource(resource) => resource,
        };

        let producer_id = ids.producer();
        let mut producer = Self::producer(resource, &producer_id, clip.duration);
        for filter in &clip.filters {
            producer.push(Self::filter_element(filter, ids.filter(), clip.duration));
        }
        root.push(producer);

        Element::new("entry")
            .attr("producer", producer_id)
            .attr("in", 0)
            .attr("out", clip.duration)
    }
}
