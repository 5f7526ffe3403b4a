//! Presentation seam. The map widget and page are external; the controller
//! only talks to them through [`MapView`].

use std::fmt;
use std::io::Write;

use crate::domain::LatLng;

/// What the widget needs to draw an empty map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSetup {
    /// Id of the container element, e.g. `map-austin`.
    pub anchor_id: String,
    pub anchor_class: &'static str,
    pub center: LatLng,
    pub zoom: u8,
    pub background_image: Option<String>,
}

/// One point to drop on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEvent {
    pub data_source: String,
    pub position: LatLng,
    pub title: Option<String>,
}

pub trait MapView {
    fn set_title(&mut self, title: &str);
    /// Attribution text for the data currently shown.
    fn set_caption(&mut self, caption: &str);
    fn show_map(&mut self, setup: &MapSetup);
    fn place_marker(&mut self, marker: &MarkerEvent);
}

/// Writes the map as text, one marker per line.
pub struct ConsoleView<W: Write> {
    out: W,
    markers: usize,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out, markers: 0 }
    }

    pub fn markers(&self) -> usize {
        self.markers
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            log::warn!("Failed to write to console view: {e}");
        }
    }
}

impl<W: Write> MapView for ConsoleView<W> {
    fn set_title(&mut self, title: &str) {
        self.line(format_args!("{title}"));
        self.line(format_args!("{}", "=".repeat(title.chars().count())));
    }

    fn set_caption(&mut self, caption: &str) {
        self.line(format_args!("Source: {caption}"));
    }

    fn show_map(&mut self, setup: &MapSetup) {
        self.line(format_args!(
            "Map #{} centered on {} at zoom {}",
            setup.anchor_id, setup.center, setup.zoom
        ));
        if let Some(image) = &setup.background_image {
            self.line(format_args!("Background: {image}"));
        }
    }

    fn place_marker(&mut self, marker: &MarkerEvent) {
        self.markers += 1;
        match &marker.title {
            Some(title) => self.line(format_args!(
                "  [{}] {} {}",
                marker.data_source, marker.position, title
            )),
            None => self.line(format_args!("  [{}] {}", marker.data_source, marker.position)),
        }
    }
}
