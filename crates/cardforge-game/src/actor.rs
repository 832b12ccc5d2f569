//! Game actor: an isolated tokio task that owns one [`Game`].
//!
//! Each game runs in its own task and is mutated only through its
//! channel, so commands targeting the same game are serialized: each
//! one observes the previous one's effects. The actor also owns the
//! participants' event sinks and does the per-observer filtering at
//! delivery time.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use cardforge_protocol::{
    GameCmd, GameId, GameInfo, PlayerId, PlayerInfo, RoomId, ServerMessage,
    UserInfo,
};

use crate::{Game, GameError, Scoped};

/// Where a participant's game events are delivered. The server side
/// drains this into the connection's writer task.
pub type EventSink = mpsc::UnboundedSender<ServerMessage>;

/// What a successful join returns: the assigned seat, the game's
/// directory entry, and a snapshot filtered for the joiner.
#[derive(Debug)]
pub struct GameJoined {
    pub player_id: PlayerId,
    pub game: GameInfo,
    pub players: Vec<PlayerInfo>,
}

enum GameMsg {
    Join {
        user: UserInfo,
        password: String,
        spectator: bool,
        is_buddy: bool,
        sink: EventSink,
        reply: oneshot::Sender<Result<GameJoined, GameError>>,
    },
    Command {
        seat: PlayerId,
        cmd: GameCmd,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Info {
        reply: oneshot::Sender<GameInfo>,
    },
    Shutdown,
}

/// Handle to a running game actor. Cheap to clone; the room registry
/// holds one per game.
#[derive(Clone)]
pub struct GameHandle {
    game_id: GameId,
    sender: mpsc::Sender<GameMsg>,
}

impl GameHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Seats a player or spectator and returns their view of the game.
    pub async fn join(
        &self,
        user: UserInfo,
        password: String,
        spectator: bool,
        is_buddy: bool,
        sink: EventSink,
    ) -> Result<GameJoined, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(GameMsg::Join {
                user,
                password,
                spectator,
                is_buddy,
                sink,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?
    }

    /// Runs one in-game command for a seat. `GameCmd::Leave` unseats
    /// the participant and drops their sink.
    pub async fn command(&self, seat: PlayerId, cmd: GameCmd) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(GameMsg::Command {
                seat,
                cmd,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?
    }

    /// The game's current directory entry.
    pub async fn info(&self) -> Result<GameInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(GameMsg::Info { reply: reply_tx })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }

    /// Stops the actor. Pending senders get `Unavailable`.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(GameMsg::Shutdown).await;
    }
}

struct GameActor {
    game: Game,
    sinks: HashMap<PlayerId, EventSink>,
    receiver: mpsc::Receiver<GameMsg>,
}

impl GameActor {
    async fn run(mut self) {
        let game_id = self.game.game_id;
        tracing::debug!(%game_id, "game actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                GameMsg::Join {
                    user,
                    password,
                    spectator,
                    is_buddy,
                    sink,
                    reply,
                } => {
                    let result = self.handle_join(user, &password, spectator, is_buddy, sink);
                    let _ = reply.send(result);
                }
                GameMsg::Command { seat, cmd, reply } => {
                    let result = self.handle_command(seat, cmd);
                    let _ = reply.send(result);
                }
                GameMsg::Info { reply } => {
                    let _ = reply.send(self.game.info());
                }
                GameMsg::Shutdown => break,
            }
        }

        tracing::debug!(%game_id, "game actor stopped");
    }

    fn handle_join(
        &mut self,
        user: UserInfo,
        password: &str,
        spectator: bool,
        is_buddy: bool,
        sink: EventSink,
    ) -> Result<GameJoined, GameError> {
        let name = user.name.clone();
        let (seat, events) = self.game.join(user, password, spectator, is_buddy)?;
        tracing::info!(game_id = %self.game.game_id, %seat, user = %name, spectator, "joined game");
        // Existing participants learn about the new seat; the joiner
        // gets the snapshot in the reply instead.
        self.broadcast(&events);
        self.sinks.insert(seat, sink);
        Ok(GameJoined {
            player_id: seat,
            game: self.game.info(),
            players: self.game.snapshot_for(seat),
        })
    }

    fn handle_command(&mut self, seat: PlayerId, cmd: GameCmd) -> Result<(), GameError> {
        let leaving = matches!(cmd, GameCmd::Leave);
        let events = self.game.apply(seat, cmd)?;
        if leaving {
            self.sinks.remove(&seat);
            tracing::info!(game_id = %self.game.game_id, %seat, "left game");
        }
        self.broadcast(&events);
        Ok(())
    }

    /// Delivers each event to every participant, in its per-observer
    /// rendition. Dead sinks are skipped; the connection cleanup path
    /// unseats them.
    fn broadcast(&self, events: &[Scoped]) {
        if events.is_empty() {
            return;
        }
        for seat in self.game.participants() {
            let Some(sink) = self.sinks.get(&seat) else {
                continue;
            };
            let observer = self.game.observer(seat);
            let rendered: Vec<_> = events.iter().map(|e| e.for_observer(&observer)).collect();
            let _ = sink.send(ServerMessage::Game {
                room_id: self.game.room_id,
                game_id: self.game.game_id,
                events: rendered,
            });
        }
    }
}

/// Spawns the actor task for a game and returns its handle.
pub fn spawn_game(game: Game, channel_size: usize) -> GameHandle {
    let game_id = game.game_id;
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = GameActor {
        game,
        sinks: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    GameHandle {
        game_id,
        sender: tx,
    }
}
