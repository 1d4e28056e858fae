use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Board dimensions
pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Number of aligned tokens needed to win
const WIN_LENGTH: i32 = 4;

/// Axis directions scanned from the last placed token: horizontal, vertical,
/// diagonal down-right and diagonal up-right.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Conventional player number, 1 or 2
    pub fn number(&self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cell {
    Empty,
    Owner(Player),
}

/// Where a token came to rest after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
}

impl Placement {
    pub fn new(row: usize, col: usize) -> Self {
        Placement { row, col }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Reasons a move is rejected. A rejected move never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Game already over")]
    GameOver,
    #[error("Column {0} is out of range")]
    InvalidColumn(usize),
    #[error("Column {0} is full")]
    ColumnFull(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Drawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Game {
    board: [[Cell; COLS]; ROWS],
    current_player: Player,
    winner: Option<Player>,
    move_count: usize,
    last_move: Option<Placement>,
}

impl Game {
    /// Create an empty game with player one to move
    pub fn new() -> Self {
        Game {
            board: [[Cell::Empty; COLS]; ROWS],
            current_player: Player::One,
            winner: None,
            move_count: 0,
            last_move: None,
        }
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Placement> {
        self.last_move
    }

    /// Cell at `(row, col)`, row 0 being the top. Out-of-range coordinates
    /// read as empty.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if row < ROWS && col < COLS {
            self.board[row][col]
        } else {
            Cell::Empty
        }
    }

    /// A column is playable until its top cell is occupied
    pub fn is_valid_move(&self, column: usize) -> bool {
        column < COLS && self.board[0][column] == Cell::Empty
    }

    /// All columns that currently accept a token, in ascending order
    pub fn valid_moves(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| self.is_valid_move(col)).collect()
    }

    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| !self.is_valid_move(col))
    }

    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(player) => GameStatus::Won(player),
            None if self.is_full() => GameStatus::Drawn,
            None => GameStatus::InProgress,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.status() != GameStatus::InProgress
    }

    /// Drop the current player's token into `column`.
    ///
    /// The token settles on the lowest empty cell. If it completes a line of
    /// four the mover becomes the winner and the turn does not pass;
    /// otherwise the turn passes to the opponent.
    pub fn apply_move(&mut self, column: usize) -> Result<Placement, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if column >= COLS {
            return Err(MoveError::InvalidColumn(column));
        }

        let row = (0..ROWS)
            .rev()
            .find(|&row| self.board[row][column] == Cell::Empty)
            .ok_or(MoveError::ColumnFull(column))?;

        self.board[row][column] = Cell::Owner(self.current_player);
        self.move_count += 1;
        let placement = Placement::new(row, column);
        self.last_move = Some(placement);

        if self.check_winner(row, column) {
            self.winner = Some(self.current_player);
        } else {
            self.current_player = self.current_player.opponent();
        }

        Ok(placement)
    }

    /// Whether the current mover owns four in a row through `(row, col)`.
    pub fn check_winner(&self, row: usize, col: usize) -> bool {
        DIRECTIONS
            .iter()
            .any(|&(dr, dc)| self.check_line(row as i32, col as i32, dr, dc))
    }

    /// Scan the seven positions centred on `(row, col)` along one axis. Every
    /// window of four that could contain the centre lies inside that span.
    fn check_line(&self, row: i32, col: i32, dr: i32, dc: i32) -> bool {
        let mover = Cell::Owner(self.current_player);
        let mut r = row - dr * (WIN_LENGTH - 1);
        let mut c = col - dc * (WIN_LENGTH - 1);
        let mut count = 0;

        for _ in 0..(2 * WIN_LENGTH - 1) {
            if self.cell_at(r, c) == Some(mover) {
                count += 1;
                if count == WIN_LENGTH {
                    return true;
                }
            } else {
                count = 0;
            }
            r += dr;
            c += dc;
        }

        false
    }

    fn cell_at(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || row >= ROWS as i32 || col < 0 || col >= COLS as i32 {
            None
        } else {
            Some(self.board[row as usize][col as usize])
        }
    }

    /// Independent copy handed to strategies
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(*self)
    }

    pub fn display_board(&self) -> String {
        let mut output = String::new();

        for row in 0..ROWS {
            for col in 0..COLS {
                let symbol = match self.board[row][col] {
                    Cell::Empty => '.',
                    Cell::Owner(Player::One) => 'X',
                    Cell::Owner(Player::Two) => 'O',
                };
                output.push(symbol);
                if col + 1 < COLS {
                    output.push(' ');
                }
            }
            output.push('\n');
        }

        let footer: Vec<String> = (0..COLS).map(|col| col.to_string()).collect();
        output.push_str(&footer.join(" "));
        output
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_board())
    }
}

/// Read-only copy of a game. Owning a snapshot gives no access to the game
/// it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot(Game);

impl Snapshot {
    /// Detach into a scratch game, e.g. for look-ahead simulation
    pub fn into_game(self) -> Game {
        self.0
    }
}

impl Deref for Snapshot {
    type Target = Game;

    fn deref(&self) -> &Game {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Column order that fills the board without ever producing four in a row
    const DRAW_SEQUENCE: [usize; 42] = [
        0, 0, 0, 0, 0, 0, //
        1, 6, 6, 1, 1, 6, 6, 1, 1, 6, 6, 1, //
        4, 2, 2, 4, 4, 2, 2, 4, 4, 2, 2, 4, //
        5, 3, 3, 5, 5, 3, 3, 5, 5, 3, 3, 5,
    ];

    /// Play `column` but keep the same player to move
    fn force_move(game: &mut Game, column: usize) {
        let player = game.current_player;
        game.apply_move(column).unwrap();
        if game.winner.is_none() {
            game.current_player = player;
        }
    }

    fn has_four(game: &Game, player: Player) -> bool {
        let owner = Cell::Owner(player);
        for row in 0..ROWS as i32 {
            for col in 0..COLS as i32 {
                for &(dr, dc) in &DIRECTIONS {
                    if (0..WIN_LENGTH)
                        .all(|i| game.cell_at(row + dr * i, col + dc * i) == Some(owner))
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    #[test]
    fn test_new_game_is_empty() {
        let game = Game::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                assert_eq!(game.cell(row, col), Cell::Empty);
            }
        }
        assert_eq!(game.current_player(), Player::One);
        assert_eq!(game.winner(), None);
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_valid_move_bounds() {
        let game = Game::new();
        for col in 0..COLS {
            assert!(game.is_valid_move(col));
        }
        assert!(!game.is_valid_move(7));
        assert!(!game.is_valid_move(usize::MAX));
    }

    #[test]
    fn test_tokens_stack_from_bottom() {
        let mut game = Game::new();
        assert_eq!(game.apply_move(3), Ok(Placement::new(5, 3)));
        assert_eq!(game.apply_move(3), Ok(Placement::new(4, 3)));
        assert_eq!(game.cell(5, 3), Cell::Owner(Player::One));
        assert_eq!(game.cell(4, 3), Cell::Owner(Player::Two));
        assert_eq!(game.last_move(), Some(Placement::new(4, 3)));
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = Game::new();
        game.apply_move(0).unwrap();
        assert_eq!(game.current_player(), Player::Two);
        game.apply_move(1).unwrap();
        assert_eq!(game.current_player(), Player::One);
    }

    #[test]
    fn test_full_column_rejected_without_change() {
        let mut game = Game::new();
        for _ in 0..ROWS {
            game.apply_move(2).unwrap();
        }
        assert!(!game.is_valid_move(2));

        let before = game;
        assert_eq!(game.apply_move(2), Err(MoveError::ColumnFull(2)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_out_of_range_column_rejected_without_change() {
        let mut game = Game::new();
        game.apply_move(4).unwrap();

        let before = game;
        assert_eq!(game.apply_move(7), Err(MoveError::InvalidColumn(7)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_vertical_win_on_fourth_placement() {
        let mut game = Game::new();
        for expected_row in [5, 4, 3] {
            force_move(&mut game, 0);
            assert_eq!(game.cell(expected_row, 0), Cell::Owner(Player::One));
            assert_eq!(game.winner(), None);
        }

        force_move(&mut game, 0);
        assert_eq!(game.cell(2, 0), Cell::Owner(Player::One));
        assert_eq!(game.winner(), Some(Player::One));
        assert_eq!(game.status(), GameStatus::Won(Player::One));
    }

    #[test]
    fn test_horizontal_win_after_fourth_column() {
        let mut game = Game::new();
        for col in 0..3 {
            game.apply_move(col).unwrap(); // player one on row 5
            game.apply_move(col).unwrap(); // player two on row 4
        }
        assert_eq!(game.winner(), None);

        game.apply_move(3).unwrap();
        assert_eq!(game.winner(), Some(Player::One));
        // The winner keeps the turn; nothing flips after a win
        assert_eq!(game.current_player(), Player::One);
    }

    #[test]
    fn test_diagonal_up_win() {
        let mut game = Game::new();
        // Player one builds (5,0) (4,1) (3,2) (2,3)
        for col in [0, 1, 1, 2, 2, 3, 2, 3, 3, 6] {
            game.apply_move(col).unwrap();
        }
        assert_eq!(game.winner(), None);
        game.apply_move(3).unwrap();
        assert_eq!(game.last_move(), Some(Placement::new(2, 3)));
        assert_eq!(game.winner(), Some(Player::One));
    }

    #[test]
    fn test_diagonal_down_win() {
        let mut game = Game::new();
        // Player one builds (5,6) (4,5) (3,4), then tops it off at (2,3)
        for col in [6, 5, 5, 4, 4, 3, 4, 3, 3, 0] {
            game.apply_move(col).unwrap();
        }
        assert_eq!(game.winner(), None);
        game.apply_move(3).unwrap();
        assert_eq!(game.winner(), Some(Player::One));
    }

    #[test]
    fn test_win_detected_when_gap_is_filled() {
        let mut game = Game::new();
        // X X . X on the bottom row, then fill the gap
        for col in [0, 0, 1, 1, 3, 3] {
            game.apply_move(col).unwrap();
        }
        assert_eq!(game.winner(), None);
        game.apply_move(2).unwrap();
        assert_eq!(game.winner(), Some(Player::One));
    }

    #[test]
    fn test_three_in_a_row_is_not_a_win() {
        let mut game = Game::new();
        for col in [0, 0, 1, 1, 2] {
            game.apply_move(col).unwrap();
        }
        assert_eq!(game.winner(), None);
        assert!(!has_four(&game, Player::One));
    }

    #[test]
    fn test_cannot_move_after_win() {
        let mut game = Game::new();
        for col in [0, 1, 0, 1, 0, 1, 0] {
            game.apply_move(col).unwrap();
        }
        assert_eq!(game.winner(), Some(Player::One));

        let before = game;
        assert_eq!(game.apply_move(5), Err(MoveError::GameOver));
        assert_eq!(game, before);
    }

    #[test]
    fn test_full_board_is_drawn() {
        let mut game = Game::new();
        for &col in &DRAW_SEQUENCE {
            game.apply_move(col).unwrap();
        }

        assert_eq!(game.winner(), None);
        assert!(game.is_full());
        assert!(game.valid_moves().is_empty());
        assert_eq!(game.status(), GameStatus::Drawn);
        assert_eq!(game.move_count(), ROWS * COLS);
        assert_eq!(game.apply_move(0), Err(MoveError::GameOver));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut game = Game::new();
        game.apply_move(3).unwrap();

        let snapshot = game.snapshot();
        let mut scratch = snapshot.into_game();
        scratch.apply_move(3).unwrap();

        assert_eq!(game.cell(4, 3), Cell::Empty);
        assert_eq!(snapshot.cell(4, 3), Cell::Empty);
        assert_eq!(scratch.cell(4, 3), Cell::Owner(Player::Two));
    }

    #[test]
    fn test_display_board() {
        let mut game = Game::new();
        game.apply_move(0).unwrap();
        game.apply_move(6).unwrap();

        let text = game.display_board();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), ROWS + 1);
        assert_eq!(lines[5], "X . . . . . O");
        assert_eq!(lines[6], "0 1 2 3 4 5 6");
    }

    #[test]
    fn test_serialized_state_for_renderers() {
        let mut game = Game::new();
        game.apply_move(2).unwrap();

        let json = serde_json::to_value(game).unwrap();
        assert_eq!(json["board"][5][2], serde_json::json!({ "Owner": "One" }));
        assert_eq!(json["board"][0][0], "Empty");
        assert_eq!(json["current_player"], "Two");
        assert_eq!(json["winner"], serde_json::Value::Null);
        assert_eq!(json["last_move"], serde_json::json!({ "row": 5, "col": 2 }));
    }

    proptest! {
        #[test]
        fn prop_winner_matches_brute_force(columns in prop::collection::vec(0usize..COLS, 0..60)) {
            let mut game = Game::new();
            for col in columns {
                let mover = game.current_player();
                if game.apply_move(col).is_ok() {
                    prop_assert_eq!(game.winner().is_some(), has_four(&game, mover));
                }
            }
        }

        #[test]
        fn prop_rejected_moves_leave_game_unchanged(
            columns in prop::collection::vec(0usize..COLS, 0..60),
            probe in 0usize..10,
        ) {
            let mut game = Game::new();
            for col in columns {
                let _ = game.apply_move(col);
            }
            let before = game;
            if game.apply_move(probe).is_err() {
                prop_assert_eq!(game, before);
            } else {
                prop_assert!(before.is_valid_move(probe));
            }
        }
    }
}
