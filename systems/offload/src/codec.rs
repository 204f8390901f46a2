//! Text codec for the wave offload exchange.
//!
//! Each direction is one newline-terminated, whitespace-delimited line.
//! Requests open with a fixed preamble token, carry the economy and timing
//! scalars, then length-prefixed groups for routes, spawn queue entries,
//! defense-unit records, and ground zones, and close with a sentinel token.
//! Responses open with a status token and mirror the scalar-then-groups
//! layout for cooldown updates and surviving zones.

use std::fmt::Write as _;

use riverguard_core::{OffloadError, WavePayload, WaveReport, ZoneRecord};

/// Protocol identifier opening every request line.
pub(crate) const PREAMBLE: &str = "RGW1";

/// Sentinel closing every request line.
pub(crate) const END_SENTINEL: &str = "END";

/// Status token opening every successful response line.
pub(crate) const OK_SENTINEL: &str = "OK";

/// Serializes `payload` into one request line, newline included.
#[must_use]
pub(crate) fn encode_payload(payload: &WavePayload) -> String {
    let mut line = String::with_capacity(256 + payload.spawn_queue.len() * 32);
    line.push_str(PREAMBLE);
    let _ = write!(
        line,
        " {} {} {} {} {} {}",
        payload.coins,
        payload.xp,
        payload.leak_coins,
        payload.leak_xp,
        payload.dt,
        payload.spawn_interval,
    );

    let _ = write!(line, " {}", payload.routes.len());
    for route in &payload.routes {
        let _ = write!(line, " {}", route.len());
        for point in route {
            let _ = write!(line, " {} {}", point.x, point.y);
        }
    }

    let _ = write!(line, " {}", payload.spawn_queue.len());
    for unit in &payload.spawn_queue {
        let _ = write!(
            line,
            " {} {} {} {} {}",
            unit.hp, unit.speed, unit.coin_reward, unit.xp_reward, unit.route_index,
        );
    }

    let _ = write!(line, " {}", payload.towers.len());
    for tower in &payload.towers {
        let stats = &tower.stats;
        let _ = write!(
            line,
            " {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            tower.slot_index,
            tower.type_index,
            tower.position.x,
            tower.position.y,
            tower.cooldown,
            stats.damage,
            stats.range,
            stats.attack_speed,
            stats.splash_radius,
            stats.splash_falloff,
            stats.burn_dps,
            stats.burn_duration,
            stats.zone_radius,
            stats.zone_dps,
            stats.zone_duration,
            stats.slow_percent,
            stats.slow_duration,
            stats.control_targets,
            stats.chain_count,
            stats.chain_falloff,
            stats.shock_duration,
        );
    }

    let _ = write!(line, " {}", payload.zones.len());
    for zone in &payload.zones {
        let _ = write!(
            line,
            " {} {} {} {} {}",
            zone.center.x, zone.center.y, zone.radius, zone.dps, zone.duration,
        );
    }

    line.push(' ');
    line.push_str(END_SENTINEL);
    line.push('\n');
    line
}

/// Token cursor over one response line.
struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            iter: line.split_whitespace(),
        }
    }

    fn next(&mut self) -> Result<&'a str, OffloadError> {
        self.iter
            .next()
            .ok_or_else(|| OffloadError::MalformedResponse("response line truncated".to_owned()))
    }

    fn parse<T: std::str::FromStr>(&mut self) -> Result<T, OffloadError> {
        let token = self.next()?;
        token
            .parse()
            .map_err(|_| OffloadError::MalformedResponse(format!("bad token `{token}`")))
    }
}

/// Parses one response line into a [`WaveReport`].
pub(crate) fn parse_report(line: &str) -> Result<WaveReport, OffloadError> {
    let mut tokens = Tokens::new(line);
    let status = tokens.next()?;
    if status != OK_SENTINEL {
        return Err(OffloadError::MalformedResponse(format!(
            "expected status `{OK_SENTINEL}`, got `{status}`"
        )));
    }

    let coins = tokens.parse()?;
    let xp = tokens.parse()?;
    let leaked = tokens.parse()?;
    let killed = tokens.parse()?;
    let cooldown_count: usize = tokens.parse()?;
    let zone_count: usize = tokens.parse()?;
    let defeat = tokens.parse::<u8>()? != 0;

    let mut cooldowns = Vec::with_capacity(cooldown_count);
    for _ in 0..cooldown_count {
        let slot = tokens.parse()?;
        let cooldown = tokens.parse()?;
        cooldowns.push((slot, cooldown));
    }

    let mut zones = Vec::with_capacity(zone_count);
    for _ in 0..zone_count {
        let x = tokens.parse()?;
        let y = tokens.parse()?;
        zones.push(ZoneRecord {
            center: glam_vec(x, y),
            radius: tokens.parse()?,
            dps: tokens.parse()?,
            duration: tokens.parse()?,
        });
    }

    Ok(WaveReport {
        coins,
        xp,
        leaked,
        killed,
        defeat,
        cooldowns,
        zones,
    })
}

fn glam_vec(x: f64, y: f64) -> glam::DVec2 {
    glam::DVec2::new(x, y)
}
