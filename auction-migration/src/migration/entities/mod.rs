mod auction;
mod award;
mod bid;
mod money;
mod period;

pub use {
    auction::*,
    award::*,
    bid::*,
    money::*,
    period::*,
};
