// ============================================================
// Layer 5 — Weight Initialisation
// ============================================================
// The recurrent models use a mixed scheme on their FIRST LSTM
// layer only: Xavier-normal for the input-to-hidden weights and
// an orthogonal matrix for the hidden-to-hidden weights (which
// keeps the recurrent Jacobian's spectrum near 1 at t=0).
// Remaining layers keep Burn's default LSTM initialisation.

use burn::{
    module::Param,
    nn::{Linear, Lstm},
    prelude::*,
    tensor::Distribution,
};
use rand::Rng;
use rand_distr::StandardNormal;

/// Xavier (Glorot) normal initialisation for a [fan_in, fan_out] weight.
pub fn xavier_normal<B: Backend>(
    fan_in: usize,
    fan_out: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let std = (2.0 / (fan_in + fan_out) as f64).sqrt();
    Tensor::random([fan_in, fan_out], Distribution::Normal(0.0, std), device)
}

/// Square orthogonal matrix: random normal entries followed by
/// modified Gram-Schmidt on the rows.
pub fn orthogonal<B: Backend>(dim: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut rng = rand::thread_rng();
    let mut rows: Vec<Vec<f32>> = (0..dim)
        .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
        .collect();

    for i in 0..dim {
        for j in 0..i {
            let dot: f32 = (0..dim).map(|k| rows[i][k] * rows[j][k]).sum();
            for k in 0..dim {
                rows[i][k] -= dot * rows[j][k];
            }
        }
        // A row can collapse to ~0 if it was (numerically) in the span
        // of the previous ones; the epsilon keeps the division finite.
        let norm: f32 = rows[i]
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt()
            .max(1e-8);
        for k in 0..dim {
            rows[i][k] /= norm;
        }
    }

    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([dim, dim])
}

/// Apply the first-layer policy to one LSTM: Xavier-normal on each
/// gate's input transform, orthogonal on each gate's hidden transform.
pub fn init_first_lstm_layer<B: Backend>(
    mut lstm: Lstm<B>,
    d_input: usize,
    d_hidden: usize,
    device: &B::Device,
) -> Lstm<B> {
    for gate in [
        &mut lstm.input_gate,
        &mut lstm.forget_gate,
        &mut lstm.cell_gate,
        &mut lstm.output_gate,
    ] {
        gate.input_transform.weight =
            Param::from_tensor(xavier_normal::<B>(d_input, d_hidden, device));
        gate.hidden_transform.weight = Param::from_tensor(orthogonal::<B>(d_hidden, device));
    }
    lstm
}

/// Replace a Linear layer's weight with a Xavier-normal draw.
pub fn xavier_linear<B: Backend>(
    mut linear: Linear<B>,
    fan_in: usize,
    fan_out: usize,
    device: &B::Device,
) -> Linear<B> {
    linear.weight = Param::from_tensor(xavier_normal::<B>(fan_in, fan_out, device));
    linear
}
