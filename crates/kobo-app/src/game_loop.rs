//! Fixed-cadence loops for the server and client roles.
//!
//! Both run on the calling thread at `tick_rate` Hz. Network reads happen on
//! the session's reader thread; the loop only drains what has arrived.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use kobo_core::commands::CommandList;
use kobo_core::level::LevelSet;
use kobo_net::server::SessionStatus;
use kobo_net::{GameClient, GameServer, NetError};
use kobo_sim::SimulationEngine;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::headless::{AutopilotInput, FrameStats};

/// Sleeps between ticks, dropping the backlog after a long stall instead of
/// running a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    tick_duration: Duration,
    next_tick_time: Instant,
}

impl TickClock {
    pub fn new(tick_rate: u32, now: Instant) -> Self {
        Self {
            tick_duration: Duration::from_nanos(1_000_000_000 / u64::from(tick_rate.max(1))),
            next_tick_time: now,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Schedule the next tick and return how long to sleep until it.
    pub fn advance(&mut self, now: Instant) -> Duration {
        self.next_tick_time += self.tick_duration;
        if self.next_tick_time > now {
            self.next_tick_time - now
        } else {
            if now - self.next_tick_time > self.tick_duration * 2 {
                self.next_tick_time = now;
            }
            Duration::ZERO
        }
    }

    pub fn wait(&mut self) {
        let sleep = self.advance(Instant::now());
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u64,
    pub frames: u64,
    pub commands: u64,
}

/// Host a round. With `two_player` set, waits for a client to take slot 1
/// first. Slot 0 is flown by the autopilot.
pub fn run_server(config: &AppConfig, levels: LevelSet) -> Result<RunReport, AppError> {
    let engine = SimulationEngine::new(config.sim.clone(), levels);
    let mut server = if config.sim.two_player {
        let listener = GameServer::bind(&config.net)?;
        info!(port = config.net.port, "waiting_for_client");
        GameServer::accept(&listener, engine, &config.net)?
    } else {
        GameServer::local(engine)
    };
    server.on_close(|reason| info!(reason = ?reason, "remote_session_closed"));

    let mut pilot = AutopilotInput::new(config.sim.seed);
    let mut stats = FrameStats::new("local", u64::from(config.tick_rate));
    let mut view = CommandList::new();
    let mut clock = TickClock::new(config.tick_rate, Instant::now());

    // Level cells built before the first tick.
    server.build_local_view(&mut view);
    view.apply(&mut stats);

    loop {
        if config.ticks.is_some_and(|limit| server.engine().tick_count() >= limit) {
            break;
        }
        let status = server.tick(&pilot)?;
        pilot.advance();

        view.clear();
        server.build_local_view(&mut view);
        view.apply(&mut stats);
        stats.end_frame();

        if status == SessionStatus::GameOver {
            info!(tick = server.engine().tick_count(), "round_over");
            break;
        }
        clock.wait();
    }

    Ok(RunReport {
        ticks: server.engine().tick_count(),
        frames: stats.frames,
        commands: stats.commands,
    })
}

/// Join a server and fly slot 1 with the autopilot until the server goes
/// away or the tick limit is reached.
pub fn run_client(config: &AppConfig) -> Result<RunReport, AppError> {
    let addr = config.server_addr();
    let mut client = GameClient::connect(&addr, &config.net)?;

    let mut pilot = AutopilotInput::new(config.sim.seed.wrapping_add(1));
    let mut stats = FrameStats::new("remote", u64::from(config.tick_rate));
    let mut clock = TickClock::new(config.tick_rate, Instant::now());
    let mut ticks = 0u64;

    while config.ticks.map_or(true, |limit| ticks < limit) {
        let sent = client.send_input(&pilot);
        let polled = sent.and_then(|()| client.poll(&mut stats));
        match polled {
            Ok(0) => {}
            Ok(_) => stats.end_frame(),
            Err(NetError::Disconnected) => {
                info!(frames = client.frames_received(), "server_closed_connection");
                break;
            }
            Err(err) => {
                warn!(error = %err, "client_connection_lost");
                return Err(err.into());
            }
        }
        pilot.advance();
        ticks += 1;
        clock.wait();
    }

    Ok(RunReport {
        ticks,
        frames: stats.frames,
        commands: stats.commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_sleeps_until_next_tick() {
        let start = Instant::now();
        let mut clock = TickClock::new(50, start);
        assert_eq!(clock.tick_duration(), Duration::from_millis(20));
        assert_eq!(clock.advance(start), Duration::from_millis(20));
        assert_eq!(
            clock.advance(start + Duration::from_millis(25)),
            Duration::from_millis(15)
        );
    }

    #[test]
    fn test_clock_resets_when_far_behind() {
        let start = Instant::now();
        let mut clock = TickClock::new(50, start);

        // Slightly late: no sleep, schedule kept so the loop catches up.
        assert_eq!(clock.advance(start + Duration::from_millis(30)), Duration::ZERO);
        assert_eq!(
            clock.advance(start + Duration::from_millis(35)),
            Duration::from_millis(5)
        );

        // Stalled for a second: schedule restarts from now.
        let stalled = start + Duration::from_secs(1);
        assert_eq!(clock.advance(stalled), Duration::ZERO);
        assert_eq!(clock.advance(stalled), Duration::from_millis(20));
    }

    #[test]
    fn test_local_server_run_stops_at_tick_limit() {
        let config = AppConfig {
            tick_rate: 1_000,
            ticks: Some(30),
            ..AppConfig::default()
        };
        let levels = LevelSet::builtin().unwrap();
        let report = run_server(&config, levels).unwrap();
        assert_eq!(report.ticks, 30);
        assert_eq!(report.frames, 30);
        assert!(report.commands > 30 * 4);
    }
}
