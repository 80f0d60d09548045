use flow_core::models::{Bounds, WindowObservation};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

use super::{ActiveWindowProbe, ProbeError};

/// EWMH probe: `_NET_ACTIVE_WINDOW` on the root, then name, class and
/// absolute geometry of that window.
pub struct X11Probe {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

impl X11Probe {
    pub fn connect() -> Result<Self, ProbeError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| ProbeError::Unavailable(e.to_string()))?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| ProbeError::Unavailable(format!("no screen {screen_num}")))?;

        let net_active_window = intern(&conn, "_NET_ACTIVE_WINDOW")?;
        let net_wm_name = intern(&conn, "_NET_WM_NAME")?;
        let utf8_string = intern(&conn, "UTF8_STRING")?;

        Ok(Self {
            conn,
            root,
            net_active_window,
            net_wm_name,
            utf8_string,
        })
    }

    fn active_window_id(&self) -> Result<Window, ProbeError> {
        let reply = self
            .conn
            .get_property(false, self.root, self.net_active_window, AtomEnum::WINDOW, 0, 1)
            .map_err(platform)?
            .reply()
            .map_err(platform)?;

        match reply.value32().and_then(|mut values| values.next()) {
            Some(0) | None => Err(ProbeError::NoActiveWindow),
            Some(window) => Ok(window),
        }
    }

    fn string_property(&self, window: Window, property: Atom, kind: Atom) -> Option<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, kind, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        if reply.value.is_empty() {
            None
        } else {
            Some(reply.value)
        }
    }

    fn title(&self, window: Window) -> String {
        self.string_property(window, self.net_wm_name, self.utf8_string)
            .or_else(|| self.string_property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into()))
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    /// `WM_CLASS` is `instance\0class\0`; the class is the application name.
    fn owner_name(&self, window: Window) -> String {
        self.string_property(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())
            .map(|bytes| {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let mut parts = text.split('\0').filter(|p| !p.is_empty());
                let instance = parts.next().unwrap_or_default().to_string();
                parts.next().map(str::to_string).unwrap_or(instance)
            })
            .unwrap_or_default()
    }

    fn bounds(&self, window: Window) -> Option<Bounds> {
        let geometry = self.conn.get_geometry(window).ok()?.reply().ok()?;
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)
            .ok()?
            .reply()
            .ok()?;
        Some(Bounds::new(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            i32::from(geometry.width),
            i32::from(geometry.height),
        ))
    }
}

impl ActiveWindowProbe for X11Probe {
    fn probe(&self) -> Result<WindowObservation, ProbeError> {
        let window = self.active_window_id()?;
        Ok(WindowObservation {
            owner_name: self.owner_name(window),
            title: self.title(window),
            bounds: self.bounds(window),
        })
    }
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom, ProbeError> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .map_err(platform)?
        .reply()
        .map_err(platform)?
        .atom)
}

fn platform(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::Platform(e.to_string())
}
