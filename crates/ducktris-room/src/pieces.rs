//! Piece generation and the shared, append-only piece sequence.
//!
//! Every player in a room reads the same sequence at their own offset.
//! The sequence only ever grows at the end, so two players asking for the
//! same offset always see the same pieces.

use ducktris_protocol::Piece;
use rand::Rng;

/// Draws one piece: the wildcard with probability `duck_probability`,
/// otherwise one of the seven shapes uniformly.
///
/// Probabilities outside `0.0..=1.0` behave like the nearest bound.
pub(crate) fn random_piece<R: Rng + ?Sized>(rng: &mut R, duck_probability: f64) -> Piece {
    if rng.random::<f64>() < duck_probability {
        Piece::DUCK
    } else {
        Piece(rng.random_range(1..=Piece::SHAPES))
    }
}

/// Draws `amount` pieces.
pub(crate) fn generate_batch<R: Rng + ?Sized>(
    rng: &mut R,
    duck_probability: f64,
    amount: usize,
) -> Vec<Piece> {
    (0..amount)
        .map(|_| random_piece(rng, duck_probability))
        .collect()
}

/// The room-wide piece sequence.
#[derive(Debug, Clone)]
pub(crate) struct PieceQueue {
    pieces: Vec<Piece>,
    duck_probability: f64,
}

impl PieceQueue {
    pub(crate) fn new(duck_probability: f64) -> Self {
        Self {
            pieces: Vec::new(),
            duck_probability,
        }
    }

    /// Returns `size` pieces starting at `cursor`, generating batches of
    /// `size` first if the sequence is too short.
    ///
    /// Existing pieces are never touched.
    pub(crate) fn window<R: Rng + ?Sized>(
        &mut self,
        cursor: usize,
        size: usize,
        rng: &mut R,
    ) -> &[Piece] {
        let end = cursor + size;
        while end > self.len() {
            let batch = generate_batch(rng, self.duck_probability, size);
            tracing::debug!(
                generated = batch.len(),
                total = self.len() + batch.len(),
                "extending piece sequence"
            );
            self.pieces.extend(batch);
        }
        &self.pieces[cursor..end]
    }

    pub(crate) fn len(&self) -> usize {
        self.pieces.len()
    }
}
